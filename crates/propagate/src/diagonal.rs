use nalgebra::{DMatrix, SymmetricEigen};
use num_complex::Complex64;
use traj::Hamiltonian;

use crate::C32;

/// the dense Hamiltonian of `h` in double precision
pub(crate) fn dense(h: &Hamiltonian) -> DMatrix<f64> {
    let n = h.singles();
    DMatrix::from_fn(n, n, |a, b| h.get(a, b) as f64)
}

/// Exact propagation `exp(-i H f)` through one snapshot, applied in the
/// eigenbasis of `H`
#[derive(Clone, Debug)]
pub struct DiagonalStep {
    /// eigenvectors in the columns
    vecs: DMatrix<f64>,
    phases: Vec<Complex64>,
}

impl DiagonalStep {
    pub fn new(h: &Hamiltonian, f: f64) -> Self {
        let SymmetricEigen {
            eigenvectors: vecs,
            eigenvalues: vals,
        } = SymmetricEigen::new(dense(h));
        let phases = vals
            .iter()
            .map(|e| Complex64::from_polar(1.0, -e * f))
            .collect();
        Self { vecs, phases }
    }

    /// the full propagator matrix `V exp(-i E f) Vᵀ`
    pub(crate) fn matrix(&self) -> DMatrix<Complex64> {
        let n = self.phases.len();
        DMatrix::from_fn(n, n, |a, b| {
            (0..n)
                .map(|k| self.phases[k] * self.vecs[(a, k)] * self.vecs[(b, k)])
                .sum()
        })
    }

    pub fn apply(&self, v: &mut [C32]) {
        let n = self.phases.len();
        let eig: Vec<Complex64> = (0..n)
            .map(|k| {
                let c: Complex64 = v
                    .iter()
                    .enumerate()
                    .map(|(a, x)| {
                        Complex64::new(x.re as f64, x.im as f64)
                            * self.vecs[(a, k)]
                    })
                    .sum();
                c * self.phases[k]
            })
            .collect();
        for (a, x) in v.iter_mut().enumerate() {
            let s: Complex64 =
                eig.iter().enumerate().map(|(k, c)| *c * self.vecs[(a, k)]).sum();
            *x = C32::new(s.re as f32, s.im as f32);
        }
    }
}
