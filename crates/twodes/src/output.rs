//! The six response tables written by the root.

use std::{fs, path::Path};

use crate::{
    Error,
    config::Config,
    grids::{Part, Phase, ResponseSet},
    polar::Geometry,
};

/// the file name of the table for `geometry` and `phase`, like `RparI.dat`
pub fn file_name(geometry: Geometry, phase: Phase) -> String {
    format!("R{geometry}{}.dat", phase.label())
}

/// every output file name in the order they are written
pub fn file_names() -> impl Iterator<Item = String> {
    Geometry::ALL.into_iter().flat_map(|g| {
        Phase::ALL.into_iter().map(move |phase| file_name(g, phase))
    })
}

/// whether any output file already exists in `dir`
pub fn exists(dir: impl AsRef<Path>) -> bool {
    let dir = dir.as_ref();
    file_names().any(|f| dir.join(f).exists())
}

/// `x` in scientific notation with six decimals and an exponent of at least
/// two signed digits, like `5.000000e-01`
pub fn scientific(x: f32) -> String {
    let s = format!("{x:.6e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => s,
    }
}

/// Format the table for `geometry` and `phase`, one row of `t1 t2 t3 Re Im`
/// per printed cell with t3 running fastest. Times are in fs.
pub fn format_table(
    config: &Config,
    grids: &ResponseSet,
    geometry: Geometry,
    phase: Phase,
) -> String {
    let re = grids.grid(geometry, phase, Part::Real);
    let im = grids.grid(geometry, phase, Part::Imaginary);
    let dt = config.deltat;
    let t2 = config.tmax2 as f32 * dt;
    let mut ret = String::new();
    for t1 in (0..config.tmax1).step_by(config.dt1) {
        for t3 in (0..config.tmax3).step_by(config.dt3) {
            ret.push_str(&format!(
                "{:.6} {:.6} {:.6} {} {}\n",
                t1 as f32 * dt,
                t2,
                t3 as f32 * dt,
                scientific(re[(t3, t1)]),
                scientific(im[(t3, t1)]),
            ));
        }
    }
    ret
}

/// write all six tables to the output directory of `config`, creating it if
/// needed
pub fn write(config: &Config, grids: &ResponseSet) -> Result<(), Error> {
    let dir = Path::new(&config.output_dir);
    let io = |e: std::io::Error| {
        Error::Io(format!("failed to write output to {dir:?} with {e}"))
    };
    fs::create_dir_all(dir).map_err(io)?;
    for g in Geometry::ALL {
        for phase in Phase::ALL {
            let table = format_table(config, grids, g, phase);
            fs::write(dir.join(file_name(g, phase)), table).map_err(io)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use nalgebra::DMatrix;
    use tempfile::tempdir;
    use test_case::test_case;

    use super::*;
    use crate::config::Technique;

    /// grids where the real part of cell `(t3, t1)` is `t1 + t3 / 4` and the
    /// imaginary part is its negative, in every grid
    fn ramp(tmax3: usize, tmax1: usize) -> ResponseSet {
        let mut ret = ResponseSet::zeros(tmax3, tmax1);
        let m = DMatrix::from_fn(tmax3, tmax1, |t3, t1| {
            t1 as f32 + t3 as f32 / 4.0
        });
        for (i, s) in ret.slices_mut().enumerate() {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            for (x, y) in s.iter_mut().zip(m.iter()) {
                *x = sign * y;
            }
        }
        ret
    }

    #[test]
    fn names() {
        let got: Vec<_> = file_names().collect();
        assert_eq!(
            got,
            [
                "RparI.dat",
                "RparII.dat",
                "RperI.dat",
                "RperII.dat",
                "RcroI.dat",
                "RcroII.dat"
            ]
        );
    }

    #[test]
    fn table() {
        let c = Config::new(1, 100, [4, 3, 3], Technique::Full)
            .deltat(2.5)
            .dt1(2)
            .dt3(2);
        let got =
            format_table(&c, &ramp(3, 4), Geometry::Parallel, Phase::Rephasing);
        assert_snapshot!(got, @r"
        0.000000 7.500000 0.000000 0.000000e+00 -0.000000e+00
        0.000000 7.500000 5.000000 5.000000e-01 -5.000000e-01
        5.000000 7.500000 0.000000 2.000000e+00 -2.000000e+00
        5.000000 7.500000 5.000000 2.500000e+00 -2.500000e+00
        ");
    }

    #[test_case(0.0, "0.000000e+00")]
    #[test_case(-0.5, "-5.000000e-01")]
    #[test_case(1234.5678, "1.234568e+03")]
    #[test_case(3.0e-12, "3.000000e-12")]
    #[test_case(-7.25e37, "-7.250000e+37")]
    fn exponents(x: f32, want: &str) {
        assert_eq!(scientific(x), want);
    }

    #[test]
    fn write_all() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let c = Config::new(1, 100, [3, 0, 2], Technique::Full)
            .output_dir(out.to_string_lossy().into_owned());
        assert!(!exists(&out));
        write(&c, &ramp(2, 3)).unwrap();
        assert!(exists(&out));
        for name in file_names() {
            let got = std::fs::read_to_string(out.join(name)).unwrap();
            assert_eq!(got.lines().count(), 6);
        }
    }
}
