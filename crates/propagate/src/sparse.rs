use traj::Hamiltonian;

use crate::{C32, DiagonalStep};

/// one stored element of a [SparseUnitary]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Element {
    pub row: usize,
    pub col: usize,
    pub value: C32,
}

/// The one-exciton propagator `U = exp(-i H f)` of one substep with every
/// element of squared magnitude at or below a threshold dropped.
///
/// `H` is real symmetric, so `U` is complex symmetric and `U[(a, b)] ==
/// U[(b, a)]`; the orientation of the stored indices therefore has no effect
/// on the result.
#[derive(Clone, Debug)]
pub struct SparseUnitary {
    singles: usize,
    elements: Vec<Element>,
}

impl SparseUnitary {
    pub fn new(h: &Hamiltonian, f: f64, threshold: f32) -> Self {
        let u = DiagonalStep::new(h, f).matrix();
        let singles = h.singles();
        let mut elements = Vec::new();
        for row in 0..singles {
            for col in 0..singles {
                let z = u[(row, col)];
                if z.norm_sqr() > threshold as f64 {
                    elements.push(Element {
                        row,
                        col,
                        value: C32::new(z.re as f32, z.im as f32),
                    });
                }
            }
        }
        Self { singles, elements }
    }

    pub fn singles(&self) -> usize {
        self.singles
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// the fraction of dropped elements, in percent
    pub fn efficiency(&self) -> f64 {
        let n = self.singles * self.singles;
        if n == 0 {
            return 0.0;
        }
        (1.0 - self.elements.len() as f64 / n as f64) * 100.0
    }

    /// compute `U v` for a one-exciton vector
    pub fn apply(&self, v: &mut [C32]) {
        let mut w = vec![C32::default(); self.singles];
        for &Element { row, col, value } in &self.elements {
            w[row] += value * v[col];
        }
        v.copy_from_slice(&w);
    }

    /// compute `U X Uᵀ` for the row-major `singles`x`singles` matrix `x`,
    /// which moves both excitations of a two-exciton state
    pub(crate) fn apply_both(&self, x: &mut [C32]) {
        let n = self.singles;
        let mut y = vec![C32::default(); n * n];
        // Y = U X
        for &Element { row, col, value } in &self.elements {
            for b in 0..n {
                y[row * n + b] += value * x[col * n + b];
            }
        }
        // X = Y Uᵀ
        x.iter_mut().for_each(|z| *z = C32::default());
        for &Element { row, col, value } in &self.elements {
            for a in 0..n {
                x[a * n + row] += value * y[a * n + col];
            }
        }
    }
}
