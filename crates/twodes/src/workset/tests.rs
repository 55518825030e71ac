use comm::{Topology, threads::launch};
use test_case::test_case;
use traj::{Frames, Hamiltonian};

use super::*;
use crate::config::Technique;

fn config(length: usize) -> Config {
    Config::new(1, length, [4, 2, 3], Technique::Bleach).sample(5)
}

/// a trajectory whose sample `i` carries cluster label `i mod 2`
fn labelled(config: &Config) -> Frames {
    let stride = config.sample;
    let tmax1 = config.tmax1;
    Frames::constant(&Hamiltonian::zeros(1), config.length, [1.0; 3], 0.0)
        .with_clusters(|f| {
            if f < tmax1 || (f - tmax1) % stride != 0 {
                // never read
                7
            } else {
                (((f - tmax1) / stride) % 2) as i32
            }
        })
}

#[test]
fn sample_count() {
    // (100 - 4 - 2 - 3 - 1) / 5 + 1
    assert_eq!(total_samples(&config(100)).unwrap(), 19);
    assert_eq!(total_samples(&config(10)).unwrap(), 1);
    let err = total_samples(&config(9)).unwrap_err();
    assert!(err.is_insufficient_data());
    assert_eq!(
        err,
        Error::InsufficientData {
            length: 9,
            needed: 10
        }
    );
}

#[test]
fn range() {
    let c = config(100).begin(3).end(7);
    let got = plan(&c, 19, None::<&Frames>).unwrap();
    assert_eq!((got.begin, got.end, got.samples), (3, 7, 4));
    assert_eq!(got.items.len(), 4 * DIRECTIONS);
    assert_eq!(got.items[0], WorkItem { sample: 3, pol: 0 });
    assert_eq!(got.items[83], WorkItem { sample: 6, pol: 20 });

    let got = plan(&config(100).begin(4), 19, None::<&Frames>).unwrap();
    assert_eq!((got.end, got.samples), (19, 15));
}

#[test]
fn empty_range() {
    let got = plan(&config(100).begin(5).end(5), 19, None::<&Frames>).unwrap();
    assert!(got.items.is_empty());
    assert_eq!(got.samples, 1);
    assert_eq!(got.share(3), 0);
}

#[test_case(1, 1)]
#[test_case(1, 4)]
#[test_case(3, 2)]
#[test_case(5, 8)]
#[test_case(19, 7)]
fn padding(samples: usize, size: usize) {
    let c = config(100).end(samples);
    let p = plan(&c, 19, None::<&Frames>).unwrap();
    let packed = p.pack(size);
    let work = DIRECTIONS * samples;
    let slots = work.div_ceil(size) * size;
    assert_eq!(packed.len(), 2 * slots);
    assert!(packed[..2 * work].iter().all(|&x| x != SKIP));
    assert!(packed[2 * work..].iter().all(|&x| x == SKIP));
}

#[test_case(1, 1)]
#[test_case(2, 1)]
#[test_case(4, 2)]
#[test_case(7, 3)]
fn scatter(size: usize, local: usize) {
    let c = config(100).end(3);
    let shares = launch(size, local, |t: Topology<_>| {
        let p = t.is_root().then(|| plan(&c, 19, None::<&Frames>).unwrap());
        distribute(&t.world, p.as_ref())
    });
    let slots = (3 * DIRECTIONS).div_ceil(size);
    let mut all = Vec::new();
    for share in shares {
        assert_eq!(share.slots, slots);
        assert!(share.items.len() <= slots);
        assert_eq!(share.samples, 3);
        all.extend(share.items);
    }
    let want = plan(&c, 19, None::<&Frames>).unwrap().items;
    assert_eq!(all, want);
}

#[test]
fn clusters() {
    let c = config(100).cluster(0);
    let frames = labelled(&c);
    let got = plan(&c, 19, Some(&frames)).unwrap();
    // samples 0, 2, .., 18
    assert_eq!(got.samples, 10);
    assert_eq!(got.cluster_matches, 10);
    assert!(got.samples.abs_diff(19 / 2) <= 1);
    assert!(got.items.iter().all(|i| i.sample % 2 == 0));
    assert_eq!(got.items.len(), 10 * DIRECTIONS);

    let got = plan(&c.clone().cluster(1), 19, Some(&frames)).unwrap();
    assert_eq!(got.samples, 9);
    assert!(got.items.iter().all(|i| i.sample % 2 == 1));

    // no sample matches, so the count is floored at 1
    let got = plan(&c.cluster(5), 19, Some(&frames)).unwrap();
    assert!(got.items.is_empty());
    assert_eq!(got.samples, 1);
    assert_eq!(got.cluster_matches, 0);
}

#[test]
fn short_cluster_stream() {
    let c = config(100).cluster(0);
    let frames = labelled(&config(50));
    let err = plan(&c, 19, Some(&frames)).unwrap_err();
    assert!(err.is_short_buffer());
}

#[test]
fn missing_labels() {
    let c = config(100).cluster(0);
    assert!(matches!(
        plan(&c, 19, None::<&Frames>),
        Err(Error::Config(_))
    ));
}
