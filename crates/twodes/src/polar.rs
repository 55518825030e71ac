//! The 21 combinations of field polarizations that make up an isotropic
//! average of the fourth-rank response tensor.
//!
//! Directions 0..3 are `iiii`, 3..9 are `iijj`, 9..15 are `ijij`, and 15..21
//! are `ijji`, where the off-diagonal pairs `(i, j)` run over `xy xz yx yz zx
//! zy`.

use std::fmt::Display;

use traj::Axis;

/// number of polarization directions
pub const DIRECTIONS: usize = 21;

/// The laboratory-frame polarization geometries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Geometry {
    /// all four fields parallel
    Parallel,

    /// pump and probe perpendicular
    Perpendicular,

    /// the cross-polarized combination
    Cross,
}

impl Geometry {
    pub const ALL: [Geometry; 3] =
        [Geometry::Parallel, Geometry::Perpendicular, Geometry::Cross];

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl Display for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Geometry::Parallel => write!(f, "par"),
            Geometry::Perpendicular => write!(f, "per"),
            Geometry::Cross => write!(f, "cro"),
        }
    }
}

const PAIRS: [(Axis, Axis); 6] = [
    (Axis::X, Axis::Y),
    (Axis::X, Axis::Z),
    (Axis::Y, Axis::X),
    (Axis::Y, Axis::Z),
    (Axis::Z, Axis::X),
    (Axis::Z, Axis::Y),
];

/// the molecular-frame axes of the four interactions for direction `pol`
pub fn axes(pol: usize) -> [Axis; 4] {
    assert!(pol < DIRECTIONS, "polarization direction {pol} out of range");
    if pol < 3 {
        return [Axis::ALL[pol]; 4];
    }
    let (i, j) = PAIRS[(pol - 3) % 6];
    match (pol - 3) / 6 {
        0 => [i, i, j, j],
        1 => [i, j, i, j],
        _ => [i, j, j, i],
    }
}

/// the weight of direction `pol` in the isotropic average for `geometry`
pub fn weight(geometry: Geometry, pol: usize) -> f32 {
    let w = match geometry {
        Geometry::Parallel => {
            if pol < 3 {
                6.0
            } else {
                2.0
            }
        }
        Geometry::Perpendicular => match pol {
            0..3 => 2.0,
            3..9 => 4.0,
            _ => -1.0,
        },
        Geometry::Cross => match pol {
            0..9 => 0.0,
            9..15 => 5.0,
            _ => -5.0,
        },
    };
    w / 30.0
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use test_case::test_case;
    use traj::Axis::*;

    use super::*;

    #[test_case(0, [X, X, X, X])]
    #[test_case(2, [Z, Z, Z, Z])]
    #[test_case(3, [X, X, Y, Y])]
    #[test_case(8, [Z, Z, Y, Y])]
    #[test_case(9, [X, Y, X, Y])]
    #[test_case(14, [Z, Y, Z, Y])]
    #[test_case(15, [X, Y, Y, X])]
    #[test_case(20, [Z, Y, Y, Z])]
    fn directions(pol: usize, want: [Axis; 4]) {
        assert_eq!(axes(pol), want);
    }

    #[test_case(Geometry::Parallel, 1.8)]
    #[test_case(Geometry::Perpendicular, 0.6)]
    #[test_case(Geometry::Cross, 0.0)]
    fn weight_sums(g: Geometry, want: f32) {
        let got: f32 = (0..DIRECTIONS).map(|p| weight(g, p)).sum();
        assert_abs_diff_eq!(got, want, epsilon = 1e-6);
    }

    #[test]
    fn every_direction_distinct() {
        let mut all: Vec<_> = (0..DIRECTIONS).map(axes).collect();
        all.sort_by_key(|a| a.map(Axis::index));
        all.dedup();
        assert_eq!(all.len(), DIRECTIONS);
    }
}
