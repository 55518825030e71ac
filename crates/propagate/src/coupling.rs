use traj::Hamiltonian;

use crate::C32;

/// one pairwise coupling rotation
#[derive(Clone, Copy, Debug)]
struct Rotation {
    a: usize,
    b: usize,
    cos: f32,
    sin: f32,
}

/// Trotter propagation: each substep applies the site-energy phases and then
/// a 2x2 rotation for every coupling above the cut
#[derive(Clone, Debug)]
pub struct CouplingStep {
    diagonal: Vec<C32>,
    rotations: Vec<Rotation>,
    substeps: usize,
}

impl CouplingStep {
    /// `f` is the phase factor of one substep
    pub fn new(h: &Hamiltonian, f: f64, substeps: usize, cut: f32) -> Self {
        let n = h.singles();
        let diagonal = (0..n)
            .map(|a| {
                let (s, c) = (h.get(a, a) as f64 * f).sin_cos();
                C32::new(c as f32, -s as f32)
            })
            .collect();
        let mut rotations = Vec::new();
        for a in 0..n {
            for b in a + 1..n {
                let j = h.get(a, b);
                if j.abs() > cut {
                    let (s, c) = (j as f64 * f).sin_cos();
                    rotations.push(Rotation {
                        a,
                        b,
                        cos: c as f32,
                        sin: s as f32,
                    });
                }
            }
        }
        Self {
            diagonal,
            rotations,
            substeps,
        }
    }

    /// apply a single substep to `v`
    pub fn apply_once(&self, v: &mut [C32]) {
        for (x, d) in v.iter_mut().zip(&self.diagonal) {
            *x *= d;
        }
        for &Rotation { a, b, cos, sin } in &self.rotations {
            let (va, vb) = (v[a], v[b]);
            // exp(-i J f σx)
            v[a] = va * cos + C32::new(0.0, -sin) * vb;
            v[b] = vb * cos + C32::new(0.0, -sin) * va;
        }
    }

    /// apply every substep of the snapshot to `v`
    pub fn apply(&self, v: &mut [C32]) {
        for _ in 0..self.substeps {
            self.apply_once(v);
        }
    }

    pub fn singles(&self) -> usize {
        self.diagonal.len()
    }
}
