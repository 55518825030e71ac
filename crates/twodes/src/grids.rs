//! The twelve response accumulators.
//!
//! Every polarization geometry has a rephasing and a non-rephasing response,
//! each stored as a real and an imaginary grid indexed by `(t3, t1)`. The
//! grids are kept in one ordered collection so that setup, accumulation, and
//! reduction can all loop over them uniformly.

use nalgebra::DMatrix;
use num_complex::Complex32;

use crate::{
    decay::Decay,
    polar::{Geometry, weight},
};

/// The two time orderings of the third-order diagrams
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// the `kI` signal
    Rephasing,

    /// the `kII` signal
    NonRephasing,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::Rephasing, Phase::NonRephasing];

    /// the suffix used in output file names
    pub const fn label(self) -> &'static str {
        match self {
            Phase::Rephasing => "I",
            Phase::NonRephasing => "II",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Part {
    Real,
    Imaginary,
}

/// number of grids in a [ResponseSet]
pub const GRIDS: usize = 12;

#[derive(Clone, Debug, PartialEq)]
pub struct ResponseSet {
    grids: Vec<DMatrix<f32>>,
}

impl ResponseSet {
    pub fn zeros(tmax3: usize, tmax1: usize) -> Self {
        Self {
            grids: vec![DMatrix::zeros(tmax3, tmax1); GRIDS],
        }
    }

    /// position of a grid in the collection, ordered as real and imaginary
    /// parts of the rephasing and then the non-rephasing response of the
    /// parallel, perpendicular, and cross geometries
    #[inline]
    pub const fn index(geometry: Geometry, phase: Phase, part: Part) -> usize {
        geometry.index() * 4 + phase as usize * 2 + part as usize
    }

    pub fn grid(
        &self,
        geometry: Geometry,
        phase: Phase,
        part: Part,
    ) -> &DMatrix<f32> {
        &self.grids[Self::index(geometry, phase, part)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &DMatrix<f32>> {
        self.grids.iter()
    }

    /// the flat storage of every grid, for reduction
    pub fn slices_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.grids.iter_mut().map(|g| g.as_mut_slice())
    }

    /// Add the contributions `rephasing` and `non_rephasing` of polarization
    /// direction `pol` to cell `(t3, t1)`. The imaginary part of a contribution
    /// goes to the real grid and its real part to the imaginary grid, weighted
    /// by the decay and the polarization weight of each geometry.
    pub fn add(
        &mut self,
        t3: usize,
        t1: usize,
        pol: usize,
        decay: &Decay,
        rephasing: Complex32,
        non_rephasing: Complex32,
    ) {
        let d = decay.get(t3, t1);
        for g in Geometry::ALL {
            let w = weight(g, pol) * d;
            for (phase, z) in [
                (Phase::Rephasing, rephasing),
                (Phase::NonRephasing, non_rephasing),
            ] {
                self.grids[Self::index(g, phase, Part::Real)][(t3, t1)] +=
                    z.im * w;
                self.grids[Self::index(g, phase, Part::Imaginary)]
                    [(t3, t1)] += z.re * w;
            }
        }
    }

    /// divide every cell by `n`
    pub fn normalize(&mut self, n: usize) {
        let n = n as f32;
        for x in self.grids.iter_mut().flat_map(|g| g.iter_mut()) {
            *x /= n;
        }
    }

    /// the sum of every cell of every grid
    pub fn total(&self) -> f64 {
        self.grids.iter().flat_map(|g| g.iter()).map(|&x| x as f64).sum()
    }
}
