use approx::assert_abs_diff_eq;
use comm::threads::launch;
use tempfile::tempdir;
use test_case::test_case;
use traj::{Frames, Hamiltonian};

use super::*;
use crate::{
    config::Technique,
    grids::{Part, Phase},
    polar::Geometry,
};

/// the root's result of running `config` on `size` threads in nodes of
/// `local`
fn threaded(
    config: &Config,
    frames: &Frames,
    size: usize,
    local: usize,
) -> Summary {
    let mut got = launch(size, local, |t| {
        compute(config, &t, frames, Some(frames)).unwrap()
    });
    assert!(got[1..].iter().all(Option::is_none));
    got.swap_remove(0).unwrap()
}

fn assert_grids_eq(a: &ResponseSet, b: &ResponseSet, epsilon: f32) {
    for (x, y) in a.iter().zip(b.iter()) {
        for (x, y) in x.iter().zip(y.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = epsilon);
        }
    }
}

#[test_case(1, 1)]
#[test_case(2, 1)]
#[test_case(2, 2)]
#[test_case(4, 1)]
#[test_case(4, 2)]
#[test_case(8, 1)]
#[test_case(8, 2)]
fn process_count(size: usize, local: usize) {
    let frames = Frames::random(3, 30, 50.0, 11);
    let c = Config::new(3, 30, [3, 1, 3], Technique::Full)
        .deltat(2.0)
        .sample(4);
    let want = compute(&c, &Topology::solo(), &frames, None::<&Frames>)
        .unwrap()
        .unwrap();
    assert_eq!(want.samples, 6);
    let got = threaded(&c, &frames, size, local);
    assert_eq!(got.samples, want.samples);
    assert_abs_diff_eq!(got.grids.total(), want.grids.total(), epsilon = 1e-4);
    assert_grids_eq(&got.grids, &want.grids, 1e-5);
}

/// a single state with a zero Hamiltonian and unit dipoles, bleach only
#[test_case(1 ; "one")]
#[test_case(2 ; "two")]
fn bleach_scenario(size: usize) {
    let frames =
        Frames::constant(&Hamiltonian::zeros(1), 8, [1.0; 3], 0.0);
    let c = Config::new(1, 8, [2, 1, 2], Technique::Bleach).end(1);
    let got = threaded(&c, &frames, size, 1);
    assert_eq!(got.samples, 1);

    let decay = Decay::from_config(&c);
    for g in Geometry::ALL {
        let want = match g {
            Geometry::Parallel => -1.8,
            Geometry::Perpendicular => -0.6,
            Geometry::Cross => 0.0,
        };
        for phase in Phase::ALL {
            let re = got.grids.grid(g, phase, Part::Real);
            assert!(re.iter().all(|&x| x == 0.0));
            let im = got.grids.grid(g, phase, Part::Imaginary);
            for t3 in 0..2 {
                for t1 in 0..2 {
                    assert_abs_diff_eq!(
                        im[(t3, t1)],
                        want * decay.get(t3, t1),
                        epsilon = 1e-6
                    );
                }
            }
        }
    }

    let solo = compute(&c, &Topology::solo(), &frames, None::<&Frames>)
        .unwrap()
        .unwrap();
    assert_grids_eq(&got.grids, &solo.grids, 1e-6);
}

/// with identical samples, keeping half of them leaves the normalized
/// response unchanged
#[test]
fn cluster_filter() {
    let c = Config::new(1, 100, [4, 2, 3], Technique::Bleach).sample(5);
    let frames = Frames::constant(&Hamiltonian::zeros(1), 100, [1.0; 3], 0.0)
        .with_clusters(|f| {
            if f < 4 {
                -1
            } else {
                (((f - 4) / 5) % 2) as i32
            }
        });
    let all = threaded(&c, &frames, 3, 2);
    assert_eq!(all.samples, 19);
    let got = threaded(&c.clone().cluster(0), &frames, 3, 2);
    assert_eq!(got.samples, 10);
    assert_eq!(got.cluster_matches, 10);
    assert_grids_eq(&got.grids, &all.grids, 1e-5);
}

#[test]
fn too_short() {
    let frames =
        Frames::constant(&Hamiltonian::zeros(1), 4, [1.0; 3], 0.0);
    let c = Config::new(1, 4, [2, 1, 2], Technique::Bleach);
    let got = launch(2, 1, |t| {
        compute(&c, &t, &frames, None::<&Frames>).unwrap_err()
    });
    for err in got {
        assert!(err.is_insufficient_data());
    }
}

#[test]
fn files() {
    let dir = tempdir().unwrap();
    let frames = Frames::random(2, 12, 40.0, 3);
    let written = frames.write(dir.path()).unwrap();
    let path = |p: &std::path::Path| p.to_string_lossy().into_owned();
    let out = dir.path().join("out");
    let c = Config::new(2, 12, [3, 1, 3], Technique::Full)
        .deltat(2.0)
        .energy_file(path(&written.energy))
        .dipole_file(path(&written.dipole))
        .anharmonic_file(path(&written.anharmonicity))
        .overtone_file(path(&written.overtone))
        .output_dir(path(&out));
    run(&c, &Topology::solo()).unwrap();
    assert!(output::exists(&out));

    // the binary files hold the same trajectory as the frames
    let want = compute(&c, &Topology::solo(), &frames, None::<&Frames>)
        .unwrap()
        .unwrap();
    let files = open(&c).unwrap();
    let got = compute(&c, &Topology::solo(), &files, None::<&Frames>)
        .unwrap()
        .unwrap();
    assert_eq!(got, want);

    let err = open(&c.dipole_file(path(&dir.path().join("missing.bin"))))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Trajectory(traj::Error::FileNotFound { .. })
    ));
}

#[test_case([0, 1, 2] ; "no_t1")]
#[test_case([2, 1, 0] ; "no_t3")]
fn invalid_config(times: [usize; 3]) {
    let frames =
        Frames::constant(&Hamiltonian::zeros(1), 8, [1.0; 3], 0.0);
    let c = Config::new(1, 8, times, Technique::Bleach);
    let err = compute(&c, &Topology::solo(), &frames, None::<&Frames>)
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
