use test_case::test_case;

use super::*;
use crate::threads::launch;

#[test]
fn solo() {
    let t = Topology::solo();
    assert!(t.is_root());
    assert!(t.is_leader());
    let mut recv = [0; 2];
    t.world.scatter(0, Some(&[3, 4][..]), &mut recv);
    assert_eq!(recv, [3, 4]);
    let mut buf = [1.5, 2.5];
    t.reduce([&mut buf[..]]);
    assert_eq!(buf, [1.5, 2.5]);
}

#[test]
fn broadcast() {
    let got = launch(4, 2, |t| {
        let mut buf = if t.is_root() { [7, -1, 12] } else { [0; 3] };
        t.world.broadcast(0, &mut buf);
        buf
    });
    assert_eq!(got, vec![[7, -1, 12]; 4]);
}

#[test]
fn scatter() {
    let got = launch(3, 1, |t| {
        let send: Vec<i32> = (0..6).collect();
        let mut recv = [0; 2];
        let send = t.is_root().then_some(send.as_slice());
        t.world.scatter(0, send, &mut recv);
        recv
    });
    assert_eq!(got, vec![[0, 1], [2, 3], [4, 5]]);
}

#[test_case(1, 1; "one")]
#[test_case(4, 1; "flat")]
#[test_case(4, 2; "two nodes")]
#[test_case(5, 2; "ragged")]
#[test_case(6, 6; "one node")]
fn two_tier_reduce(size: usize, local: usize) {
    let got = launch(size, local, |t| {
        let r = t.world.rank() as f32;
        let mut a = vec![r, 1.0];
        let mut b = vec![2.0 * r];
        t.reduce([a.as_mut_slice(), b.as_mut_slice()]);
        (t.is_root(), a, b)
    });
    let n = size as f32;
    let tri = n * (n - 1.0) / 2.0;
    let (root, a, b) = &got[0];
    assert!(*root);
    assert_eq!(a, &vec![tri, n]);
    assert_eq!(b, &vec![2.0 * tri]);
    assert_eq!(got.iter().filter(|(root, ..)| *root).count(), 1);
}

#[test]
fn leaders() {
    let got = launch(5, 2, |t| {
        (
            t.world.rank(),
            t.local.rank(),
            t.local.size(),
            t.leaders.as_ref().map(|l| (l.rank(), l.size())),
        )
    });
    assert_eq!(
        got,
        vec![
            (0, 0, 2, Some((0, 3))),
            (1, 1, 2, None),
            (2, 0, 2, Some((1, 3))),
            (3, 1, 2, None),
            (4, 0, 1, Some((2, 3))),
        ]
    );
}

#[test]
fn repeated_collectives() {
    // back to back collectives must not read each other's slots
    let got = launch(4, 2, |t| {
        let mut total = 0;
        for i in 0..50 {
            let mut buf = [if t.is_root() { i } else { -1 }];
            t.world.broadcast(0, &mut buf);
            total += buf[0];
        }
        total
    });
    assert_eq!(got, vec![(0..50).sum::<i64>(); 4]);
}
