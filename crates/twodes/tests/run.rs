use std::{fs::read_to_string, path::Path};

use approx::assert_abs_diff_eq;
use assert_cmd::Command;
use tempfile::tempdir;
use test_case::test_case;
use traj::Frames;

const NAMES: [&str; 6] = [
    "RparI.dat",
    "RparII.dat",
    "RperI.dat",
    "RperII.dat",
    "RcroI.dat",
    "RcroII.dat",
];

const INPUT: &str = r#"
singles = 2
length = 40
tmax1 = 4
tmax2 = 2
tmax3 = 4
dt1 = 2
deltat = 2.0
sample = 3
lifetime = 300.0
propagation = 0
technique = "2DUVvis"
min1 = -10.0
max1 = 10.0
output_dir = "out"
"#;

/// write a synthetic trajectory and the input file to `dir`
fn setup(dir: &Path) -> std::io::Result<()> {
    Frames::random(2, 40, 50.0, 5).write(dir)?;
    std::fs::write(dir.join("twodes.toml"), INPUT)
}

fn twodes(dir: &Path, args: &[&str]) -> std::process::Output {
    Command::cargo_bin("twodes")
        .unwrap()
        .args(args)
        .current_dir(dir)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

/// every value column of every table in `dir`
fn values(dir: &Path) -> Vec<f64> {
    NAMES
        .iter()
        .flat_map(|name| {
            let table = read_to_string(dir.join(name)).unwrap();
            table
                .lines()
                .flat_map(|line| {
                    line.split_whitespace()
                        .skip(3)
                        .map(|f| f.parse::<f64>().unwrap())
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

#[test]
fn run() -> std::io::Result<()> {
    let dir = tempdir()?;
    setup(dir.path())?;

    let output = twodes(dir.path(), &[]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let out = dir.path().join("out");
    for name in NAMES {
        let table = read_to_string(out.join(name))?;
        // t1 in 0, 2 and t3 in 0..4
        assert_eq!(table.lines().count(), 8);
        let first: Vec<_> = table.lines().next().unwrap().split(' ').collect();
        assert_eq!(&first[..3], ["0.000000", "4.000000", "0.000000"]);
    }
    assert!(values(&out).iter().any(|v| v.abs() > 0.0));

    // refuse to overwrite without -o
    let output = twodes(dir.path(), &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--overwrite"));
    Ok(())
}

#[test_case(2, 1)]
#[test_case(3, 2)]
fn processes(n: usize, local: usize) -> std::io::Result<()> {
    let dir = tempdir()?;
    setup(dir.path())?;
    let output = twodes(dir.path(), &[]);
    assert!(output.status.success());
    let want = values(&dir.path().join("out"));

    let n = n.to_string();
    let local = local.to_string();
    let output = twodes(dir.path(), &["-o", "-n", &n, "-l", &local]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let got = values(&dir.path().join("out"));
    assert_eq!(got.len(), want.len());
    for (g, w) in got.iter().zip(&want) {
        assert_abs_diff_eq!(g, w, epsilon = 1e-5);
    }
    Ok(())
}

#[test]
fn json() -> std::io::Result<()> {
    let dir = tempdir()?;
    setup(dir.path())?;
    let output = twodes(dir.path(), &["-j"]);
    assert!(output.status.success());
    let got: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(got["singles"], 2);
    assert_eq!(got["technique"], "2DUVvis");
    assert_eq!(got["propagation"], "Diagonal");
    assert!(!dir.path().join("out").exists());
    Ok(())
}

#[test]
fn missing_trajectory() -> std::io::Result<()> {
    let dir = tempdir()?;
    setup(dir.path())?;
    std::fs::remove_file(dir.path().join("Dipole.bin"))?;
    let output = twodes(dir.path(), &[]);
    assert!(!output.status.success());
    assert!(!dir.path().join("out").exists());
    Ok(())
}
