use nalgebra::DMatrix;

use crate::config::Config;

/// Population relaxation weights `exp(-(t1 + t3) Δt / 2T)` for every cell of
/// a response grid. The same table serves all three pathways
#[derive(Clone, Debug, PartialEq)]
pub struct Decay {
    table: DMatrix<f32>,
}

impl Decay {
    pub fn new(tmax1: usize, tmax3: usize, deltat: f32, lifetime: f32) -> Self {
        let table = DMatrix::from_fn(tmax3, tmax1, |t3, t1| {
            (-((t1 + t3) as f64) * deltat as f64 / (2.0 * lifetime as f64))
                .exp() as f32
        });
        Self { table }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tmax1, config.tmax3, config.deltat, config.lifetime)
    }

    #[inline]
    pub fn get(&self, t3: usize, t1: usize) -> f32 {
        self.table[(t3, t1)]
    }
}
