//! The third-order response of a single work item.
//!
//! For one sample and one polarization direction, the ground-state bleach,
//! stimulated-emission, and excited-state-absorption pathways are evaluated
//! for every `(t3, t1)` cell and added to a [ResponseSet]. The t1-indexed
//! vectors are independent of each other, so their propagation and
//! projections run on the rayon pool. The propagator of a frame is built right
//! before it is applied and dropped after, so a work item only holds the
//! t1-indexed vectors.

use log::info;
use propagate::{
    C32, Direction, ICM2IFS, Propagator, Single, dipole_double,
    dipole_double_last, harmonic_overtones,
};
use rayon::prelude::*;
use traj::{Axis, Hamiltonian, Trajectory, packed_len};

use crate::{
    Error,
    config::Config,
    decay::Decay,
    grids::ResponseSet,
    polar,
    workset::{WorkItem, waiting_start},
};


/// `Σ μ_i v_i`
fn project(mu: &[f32], v: &[C32]) -> C32 {
    v.iter().zip(mu).map(|(&x, &m)| x * m).sum()
}

/// `Σ μ_i conj(v_i)`
fn project_conj(mu: &[f32], v: &[C32]) -> C32 {
    v.iter().zip(mu).map(|(&x, &m)| x.conj() * m).sum()
}

/// `Σ a_i b_i`, without conjugation
fn bilinear(a: &[C32], b: &[C32]) -> C32 {
    a.iter().zip(b).map(|(&x, &y)| x * y).sum()
}

fn conj(v: &[C32]) -> Vec<C32> {
    v.iter().map(|z| z.conj()).collect()
}

/// The state carried from the end of the waiting time into the absorption
/// pathway
struct Doubled {
    /// two-exciton vector from the reference dipole
    f: Vec<C32>,

    /// two-exciton vectors from each t1 vector
    ft1: Vec<Vec<C32>>,

    /// the conjugated reference dipole, propagated backward
    rightn: Vec<C32>,

    /// the conjugated t1 vectors, propagated backward
    rightr: Vec<Vec<C32>>,
}

pub struct Accumulator<'a, T> {
    config: &'a Config,
    trajectory: &'a T,
    decay: &'a Decay,
    propagator: Propagator,
    shift: f32,
}

impl<'a, T: Trajectory> Accumulator<'a, T> {
    pub fn new(
        config: &'a Config,
        trajectory: &'a T,
        decay: &'a Decay,
    ) -> Self {
        Self {
            config,
            trajectory,
            decay,
            propagator: config.propagator(),
            shift: config.shift(),
        }
    }

    /// the Hamiltonian at `time`, shifted to the center of the frequency
    /// window
    fn hamiltonian(&self, time: usize) -> Result<Hamiltonian, Error> {
        let mut h = Hamiltonian::zeros(self.config.singles);
        self.trajectory.hamiltonian(time, &mut h)?;
        h.shift_diagonal(self.shift);
        Ok(h)
    }

    fn mu(&self, time: usize, axis: Axis) -> Result<Vec<f32>, Error> {
        let mut mu = vec![0.0; self.config.singles];
        self.trajectory.dipole(time, axis, &mut mu)?;
        Ok(mu)
    }

    /// the dipole at `time` as a one-exciton wavefunction
    fn dipole(&self, time: usize, axis: Axis) -> Result<Vec<C32>, Error> {
        Ok(self
            .mu(time, axis)?
            .into_iter()
            .map(|m| C32::new(m, 0.0))
            .collect())
    }

    /// overtone dipoles at `time`, harmonic ones for a constant
    /// anharmonicity
    fn overtone(
        &self,
        time: usize,
        axis: Axis,
        mu: &[f32],
    ) -> Result<Vec<f32>, Error> {
        if !self.config.reads_doubles() {
            return Ok(harmonic_overtones(mu));
        }
        let mut over = vec![0.0; self.config.singles];
        self.trajectory.overtone_dipole(time, axis, &mut over)?;
        Ok(over)
    }

    fn anharmonicity(&self, time: usize) -> Result<Vec<f32>, Error> {
        if !self.config.reads_doubles() {
            return Ok(vec![self.config.anharmonicity; self.config.singles]);
        }
        let mut anh = vec![0.0; self.config.singles];
        self.trajectory.anharmonicity(time, &mut anh)?;
        Ok(anh)
    }

    fn step(&self, h: &Hamiltonian, dir: Direction) -> Single {
        self.propagator.single(self.config.propagation, h, dir)
    }

    /// the forward step through frame `time`
    fn forward(&self, time: usize) -> Result<Single, Error> {
        Ok(self.step(&self.hamiltonian(time)?, Direction::Forward))
    }

    /// Add the response of `item` to `grids`
    pub fn add(
        &self,
        item: WorkItem,
        grids: &mut ResponseSet,
    ) -> Result<(), Error> {
        let c = self.config;
        let WorkItem { sample, pol } = item;
        let technique = c.technique;
        let tj = waiting_start(c, sample);
        let tk = tj + c.tmax2;
        let [a0, a1, a2, a3] = polar::axes(pol);

        // vector t1 starts from the first dipole at tj - t1 and is carried to
        // tj through the frames in between, so frame m moves the vectors with
        // t1 >= tj - m
        let mut leftn = (0..c.tmax1)
            .into_par_iter()
            .map(|t1| self.dipole(tj - t1, a0))
            .collect::<Result<Vec<_>, Error>>()?;
        for m in tj + 1 - c.tmax1..tj {
            let step = self.forward(m)?;
            leftn[tj - m..].par_iter_mut().for_each(|v| step.apply(v));
        }

        if technique.bleach() {
            let mu2 = self.mu(tj, a1)?;
            let t1n: Vec<_> = leftn.iter().map(|v| project(&mu2, v)).collect();
            let mut mut3 = self.dipole(tk, a2)?;
            for t3 in 0..c.tmax3 {
                let mu4 = self.mu(tk + t3, a3)?;
                let t3n = project(&mu4, &mut3);
                for (t1, &z) in t1n.iter().enumerate() {
                    grids.add(
                        t3,
                        t1,
                        pol,
                        self.decay,
                        -(t3n * z.conj()),
                        -(t3n * z),
                    );
                }
                self.forward(tk + t3)?.apply(&mut mut3);
            }
        }

        if !technique.emission() && !technique.absorption() {
            return Ok(());
        }

        // population evolution during the waiting time, always exact
        let mut leftr = self.dipole(tj, a1)?;
        for t2 in 0..c.tmax2 {
            let d = self
                .propagator
                .diagonal(&self.hamiltonian(tj + t2)?, Direction::Forward);
            d.apply(&mut leftr);
            leftn.par_iter_mut().for_each(|v| d.apply(v));
        }

        let mu3 = self.mu(tk, a2)?;
        let doubled = if technique.absorption() {
            let over3 = self.overtone(tk, a2, &mu3)?;
            let nn2 = packed_len(c.singles);
            let mut f = vec![C32::default(); nn2];
            dipole_double(&mu3, &over3, &leftr, &mut f);
            let ft1 = leftn
                .par_iter()
                .map(|v| {
                    let mut f = vec![C32::default(); nn2];
                    dipole_double(&mu3, &over3, v, &mut f);
                    f
                })
                .collect();
            Some(Doubled {
                f,
                ft1,
                rightn: conj(&leftr),
                rightr: leftn.iter().map(Vec::as_slice).map(conj).collect(),
            })
        } else {
            None
        };

        if technique.emission() {
            // right sides of the non-rephasing and rephasing diagrams
            let t3n = project_conj(&mu3, &leftr);
            let t1r: Vec<_> =
                leftn.iter().map(|v| project_conj(&mu3, v)).collect();
            for t3 in 0..c.tmax3 {
                let mu4 = self.mu(tk + t3, a3)?;
                let t3r = project(&mu4, &leftr);
                let t1n: Vec<_> =
                    leftn.par_iter().map(|v| project(&mu4, v)).collect();
                for t1 in 0..c.tmax1 {
                    grids.add(
                        t3,
                        t1,
                        pol,
                        self.decay,
                        -(t3r * t1r[t1]),
                        -(t3n * t1n[t1]),
                    );
                }
                let step = self.forward(tk + t3)?;
                step.apply(&mut leftr);
                leftn.par_iter_mut().for_each(|v| step.apply(v));
            }
        }
        drop(leftn);

        if let Some(d) = doubled {
            self.absorb(item, tk, a3, d, grids)?;
        }
        Ok(())
    }

    /// the excited-state absorption pathway, which adds to the grids where the
    /// other two subtract
    fn absorb(
        &self,
        item: WorkItem,
        tk: usize,
        axis: Axis,
        mut d: Doubled,
        grids: &mut ResponseSet,
    ) -> Result<(), Error> {
        let c = self.config;
        let n = c.singles;
        for t3 in 0..c.tmax3 {
            let tl = tk + t3;
            let mu4 = self.mu(tl, axis)?;
            let over4 = self.overtone(tl, axis, &mu4)?;

            let mut leftr = vec![C32::default(); n];
            dipole_double_last(&mu4, &over4, &d.f, &mut leftr);
            let z: Vec<(C32, C32)> = d
                .ft1
                .par_iter()
                .zip(&d.rightr)
                .map(|(ft1, rightr)| {
                    let mut leftn = vec![C32::default(); n];
                    dipole_double_last(&mu4, &over4, ft1, &mut leftn);
                    (bilinear(&leftr, rightr), bilinear(&d.rightn, &leftn))
                })
                .collect();
            for (t1, (zi, zii)) in z.into_iter().enumerate() {
                grids.add(t3, t1, item.pol, self.decay, zi, zii);
            }

            let h = self.hamiltonian(tl)?;
            let anh = self.anharmonicity(tl)?;
            let doubles = self.propagator.doubles(c.propagation, &h, &anh);
            if let Some(u) = doubles.sparse() {
                if item.sample == c.begin && item.pol == 0 && t3 == 0 {
                    self.report(u.efficiency());
                }
            }
            doubles.apply(&mut d.f);
            d.ft1.par_iter_mut().for_each(|f| doubles.apply(f));

            let back = self.step(&h, Direction::Backward);
            back.apply(&mut d.rightn);
            d.rightr.par_iter_mut().for_each(|v| back.apply(v));
        }
        Ok(())
    }

    /// log the sparsity of the two-exciton propagator and the truncation in
    /// units of the squared substep phase
    fn report(&self, efficiency: f64) {
        let p = self.propagator;
        let f = p.deltat as f64 * ICM2IFS * std::f64::consts::TAU
            / p.trotter.max(1) as f64;
        info!("sparse matrix efficiency: {efficiency:.6} pct");
        info!("present truncation {:.6}", p.threshold as f64 / (f * f));
        info!("suggested truncation {:.6}", 0.001);
    }
}
