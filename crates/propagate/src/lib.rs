//! Time propagation of one- and two-exciton wavefunctions through single
//! Hamiltonian snapshots.
//!
//! A [Propagator] carries the step parameters of a run and builds the step
//! operators for one snapshot: [Single] for one-exciton vectors and [Doubles]
//! for two-exciton vectors. Building a step does the expensive work
//! (diagonalization, collecting couplings) once, so the same step can be
//! applied to many vectors, possibly from several threads.

use std::f64::consts::TAU;

use num_complex::Complex32;
use serde::{Deserialize, Serialize};
use traj::Hamiltonian;

pub mod coupling;
pub mod diagonal;
pub mod doubles;
pub mod sparse;

pub use coupling::CouplingStep;
pub use diagonal::DiagonalStep;
pub use doubles::{Doubles, dipole_double, dipole_double_last, harmonic_overtones};
pub use sparse::SparseUnitary;


pub type C32 = Complex32;

/// conversion from cm⁻¹ to fs⁻¹
pub const ICM2IFS: f64 = 2.99792458e-5;

/// the time direction of a step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    #[inline]
    pub const fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

/// How to propagate through a snapshot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// exact propagation in the eigenbasis of each snapshot. two-exciton
    /// vectors use a truncated sparse propagator
    #[serde(alias = "diagonal", alias = "sparse", alias = "Sparse")]
    Diagonal,

    /// Trotter splitting into site energies and pairwise couplings
    #[serde(alias = "coupling")]
    Coupling,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Diagonal => write!(f, "diagonal"),
            Mode::Coupling => write!(f, "coupling"),
        }
    }
}

/// a step operator for one-exciton vectors
#[derive(Clone, Debug)]
pub enum Single {
    Diagonal(DiagonalStep),
    Coupling(CouplingStep),
}

impl Single {
    /// propagate `v` in place
    pub fn apply(&self, v: &mut [C32]) {
        match self {
            Single::Diagonal(d) => d.apply(v),
            Single::Coupling(c) => c.apply(v),
        }
    }
}

/// Step parameters shared by every snapshot of a run
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Propagator {
    /// the time between snapshots in fs
    pub deltat: f32,

    /// number of substeps per snapshot for Trotter and sparse propagation
    pub trotter: usize,

    /// couplings with a magnitude below this are skipped by Trotter steps
    pub coupling_cut: f32,

    /// elements of the sparse propagator with a squared magnitude at or below
    /// this are dropped
    pub threshold: f32,
}

impl Propagator {
    pub fn new(deltat: f32) -> Self {
        Self {
            deltat,
            trotter: 1,
            coupling_cut: 0.0,
            threshold: 0.0,
        }
    }

    /// the phase factor accumulated per cm⁻¹ over one full snapshot
    #[inline]
    pub fn phase(&self, dir: Direction) -> f64 {
        self.deltat as f64 * ICM2IFS * TAU * dir.sign()
    }

    /// the phase factor of one substep
    #[inline]
    pub fn sub_phase(&self, dir: Direction) -> f64 {
        self.phase(dir) / self.trotter.max(1) as f64
    }

    pub fn diagonal(&self, h: &Hamiltonian, dir: Direction) -> DiagonalStep {
        DiagonalStep::new(h, self.phase(dir))
    }

    pub fn coupling(&self, h: &Hamiltonian, dir: Direction) -> CouplingStep {
        CouplingStep::new(
            h,
            self.sub_phase(dir),
            self.trotter.max(1),
            self.coupling_cut,
        )
    }

    /// build the one-exciton step for `mode`
    pub fn single(&self, mode: Mode, h: &Hamiltonian, dir: Direction) -> Single {
        match mode {
            Mode::Diagonal => Single::Diagonal(self.diagonal(h, dir)),
            Mode::Coupling => Single::Coupling(self.coupling(h, dir)),
        }
    }

    /// build the truncated sparse propagator of one forward substep
    pub fn sparse(&self, h: &Hamiltonian) -> SparseUnitary {
        SparseUnitary::new(
            h,
            self.sub_phase(Direction::Forward),
            self.threshold,
        )
    }

    /// build the forward two-exciton step for `mode`, where `anharmonicity`
    /// holds the diagonal anharmonicity of each state
    pub fn doubles(
        &self,
        mode: Mode,
        h: &Hamiltonian,
        anharmonicity: &[f32],
    ) -> Doubles {
        let inner = match mode {
            Mode::Diagonal => doubles::Inner::Sparse(self.sparse(h)),
            Mode::Coupling => {
                doubles::Inner::Coupling(self.coupling(h, Direction::Forward))
            }
        };
        Doubles::new(
            inner,
            anharmonicity,
            self.sub_phase(Direction::Forward),
            self.trotter.max(1),
        )
    }
}
