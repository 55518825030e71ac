//! Two-exciton states.
//!
//! A two-exciton vector holds one amplitude per pair `a <= b` in the packed
//! order of [traj::packed_index]. For propagation it is unpacked into the
//! symmetric matrix `X` with `X[a][b] = f_ab / 2` off the diagonal and `X[a][a]
//! = f_aa / √2`, in which free propagation of both excitations is `U X Uᵀ`.

use std::f32::consts::SQRT_2;

use num_complex::Complex64;
use traj::packed_index;

use crate::{C32, CouplingStep, SparseUnitary};

/// the overtone dipoles of harmonic states, `√2 μ`
pub fn harmonic_overtones(mu: &[f32]) -> Vec<f32> {
    mu.iter().map(|m| m * SQRT_2).collect()
}

/// apply the dipole operator to the one-exciton vector `c`, writing the
/// resulting two-exciton vector to `dst`. `mu` holds the one- to two-exciton
/// dipoles of the fundamentals and `over` the overtone dipoles
pub fn dipole_double(mu: &[f32], over: &[f32], c: &[C32], dst: &mut [C32]) {
    let n = mu.len();
    for a in 0..n {
        dst[packed_index(a, a, n)] = c[a] * over[a];
        for b in a + 1..n {
            dst[packed_index(a, b, n)] = c[b] * mu[a] + c[a] * mu[b];
        }
    }
}

/// the adjoint of [dipole_double]: project the two-exciton vector `f` back onto
/// the one-exciton states through `mu` and `over`, writing the result to `dst`
pub fn dipole_double_last(
    mu: &[f32],
    over: &[f32],
    f: &[C32],
    dst: &mut [C32],
) {
    let n = mu.len();
    for a in 0..n {
        let mut s = f[packed_index(a, a, n)] * over[a];
        for b in (0..n).filter(|&b| b != a) {
            s += f[packed_index(a, b, n)] * mu[b];
        }
        dst[a] = s;
    }
}

fn unpack(f: &[C32], n: usize, x: &mut [C32]) {
    for a in 0..n {
        x[a * n + a] = f[packed_index(a, a, n)] / SQRT_2;
        for b in a + 1..n {
            let v = f[packed_index(a, b, n)] * 0.5;
            x[a * n + b] = v;
            x[b * n + a] = v;
        }
    }
}

fn pack(x: &[C32], n: usize, f: &mut [C32]) {
    for a in 0..n {
        f[packed_index(a, a, n)] = x[a * n + a] * SQRT_2;
        for b in a + 1..n {
            f[packed_index(a, b, n)] = x[a * n + b] + x[b * n + a];
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Inner {
    Sparse(SparseUnitary),
    Coupling(CouplingStep),
}

impl Inner {
    fn singles(&self) -> usize {
        match self {
            Inner::Sparse(s) => s.singles(),
            Inner::Coupling(c) => c.singles(),
        }
    }

    /// one substep of both excitations
    fn apply_both(&self, x: &mut [C32]) {
        match self {
            Inner::Sparse(u) => u.apply_both(x),
            Inner::Coupling(c) => {
                let n = c.singles();
                let mut col = vec![C32::default(); n];
                for j in 0..n {
                    for i in 0..n {
                        col[i] = x[i * n + j];
                    }
                    c.apply_once(&mut col);
                    for i in 0..n {
                        x[i * n + j] = col[i];
                    }
                }
                for row in x.chunks_exact_mut(n) {
                    c.apply_once(row);
                }
            }
        }
    }
}

/// a forward step operator for two-exciton vectors
#[derive(Clone, Debug)]
pub struct Doubles {
    inner: Inner,

    /// phase picked up by the overtone state `aa` in one substep, lowered by
    /// the anharmonicity
    overtone: Vec<C32>,
    substeps: usize,
}

impl Doubles {
    pub(crate) fn new(
        inner: Inner,
        anharmonicity: &[f32],
        f: f64,
        substeps: usize,
    ) -> Self {
        let overtone = anharmonicity
            .iter()
            .map(|&d| {
                let z = Complex64::from_polar(1.0, d as f64 * f);
                C32::new(z.re as f32, z.im as f32)
            })
            .collect();
        Self {
            inner,
            overtone,
            substeps,
        }
    }

    /// the sparse propagator behind this step, if there is one
    pub fn sparse(&self) -> Option<&SparseUnitary> {
        match &self.inner {
            Inner::Sparse(s) => Some(s),
            Inner::Coupling(_) => None,
        }
    }

    /// propagate the packed two-exciton vector `f` in place
    pub fn apply(&self, f: &mut [C32]) {
        let n = self.inner.singles();
        let mut x = vec![C32::default(); n * n];
        for _ in 0..self.substeps {
            unpack(f, n, &mut x);
            self.inner.apply_both(&mut x);
            pack(&x, n, f);
            for (a, p) in self.overtone.iter().enumerate() {
                f[packed_index(a, a, n)] *= p;
            }
        }
    }
}
