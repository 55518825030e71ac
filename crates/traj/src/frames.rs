//! In-memory trajectories, mostly for synthetic data. [Frames::write] dumps
//! them in the binary layout read by [crate::Files].

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    Axis, Clusters, Error, Hamiltonian, Stream, Trajectory, check_len,
    packed_len,
};

/// The paths written by [Frames::write]
#[derive(Clone, Debug, PartialEq)]
pub struct Written {
    pub energy: PathBuf,
    pub dipole: PathBuf,
    pub anharmonicity: PathBuf,
    pub overtone: PathBuf,
    pub cluster: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frames {
    pub singles: usize,

    /// packed Hamiltonians, one per frame
    pub hamiltonians: Vec<Vec<f32>>,

    /// `3 * singles` dipoles per frame, x block first
    pub dipoles: Vec<Vec<f32>>,

    /// `singles` anharmonicities per frame
    pub anharmonicities: Vec<Vec<f32>>,

    /// `3 * singles` overtone dipoles per frame
    pub overtones: Vec<Vec<f32>>,

    /// cluster label of each frame. empty if there are no clusters
    pub clusters: Vec<i32>,
}

impl Frames {
    /// `length` identical frames with Hamiltonian `hamiltonian` and dipole
    /// `dipole` on every state. overtone dipoles are harmonic (√2 μ) and the
    /// anharmonicity is `anharmonicity` on every state
    pub fn constant(
        hamiltonian: &Hamiltonian,
        length: usize,
        dipole: [f32; 3],
        anharmonicity: f32,
    ) -> Self {
        let n = hamiltonian.singles();
        let mu: Vec<f32> = dipole
            .iter()
            .flat_map(|&d| std::iter::repeat_n(d, n))
            .collect();
        let over: Vec<f32> =
            mu.iter().map(|m| m * std::f32::consts::SQRT_2).collect();
        Self {
            singles: n,
            hamiltonians: vec![hamiltonian.as_slice().to_vec(); length],
            dipoles: vec![mu; length],
            anharmonicities: vec![vec![anharmonicity; n]; length],
            overtones: vec![over; length],
            clusters: Vec::new(),
        }
    }

    /// a random trajectory of `length` frames seeded by `seed`. site energies
    /// fluctuate by `width` cm⁻¹ around zero, couplings are drawn from ±`width`
    /// / 5, and dipoles from the unit cube
    pub fn random(singles: usize, length: usize, width: f32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut ret = Self {
            singles,
            ..Default::default()
        };
        let n = singles;
        let jmax = width / 5.0;
        for _ in 0..length {
            let mut h = Hamiltonian::zeros(n);
            for a in 0..n {
                h.set(a, a, rng.gen_range(-width..=width));
                for b in a + 1..n {
                    h.set(a, b, rng.gen_range(-jmax..=jmax));
                }
            }
            ret.hamiltonians.push(h.as_slice().to_vec());
            let mu: Vec<f32> =
                (0..3 * n).map(|_| rng.gen_range(-1.0..=1.0)).collect();
            let over = mu
                .iter()
                .map(|m| {
                    m * std::f32::consts::SQRT_2 * rng.gen_range(0.9..=1.1)
                })
                .collect();
            ret.dipoles.push(mu);
            ret.overtones.push(over);
            ret.anharmonicities
                .push((0..n).map(|_| rng.gen_range(10.0..=30.0)).collect());
        }
        ret
    }

    /// label frame `i` with `f(i)`
    pub fn with_clusters(mut self, f: impl Fn(usize) -> i32) -> Self {
        self.clusters = (0..self.len()).map(f).collect();
        self
    }

    pub fn len(&self) -> usize {
        self.hamiltonians.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hamiltonians.is_empty()
    }

    fn frame<'a>(
        data: &'a [Vec<f32>],
        stream: Stream,
        time: usize,
    ) -> Result<&'a [f32], Error> {
        data.get(time)
            .map(Vec::as_slice)
            .ok_or(Error::ShortBuffer { stream, time })
    }

    /// write the frames to `dir` as Energy.bin, Dipole.bin,
    /// Anharmonicity.bin, OvertoneDipole.bin, and, if there are clusters,
    /// Cluster.bin
    pub fn write(&self, dir: impl AsRef<Path>) -> io::Result<Written> {
        let dir = dir.as_ref();
        let ret = Written {
            energy: dir.join("Energy.bin"),
            dipole: dir.join("Dipole.bin"),
            anharmonicity: dir.join("Anharmonicity.bin"),
            overtone: dir.join("OvertoneDipole.bin"),
            cluster: (!self.clusters.is_empty())
                .then(|| dir.join("Cluster.bin")),
        };
        write_framed(&ret.energy, &self.hamiltonians)?;
        write_framed(&ret.dipole, &self.dipoles)?;
        write_framed(&ret.anharmonicity, &self.anharmonicities)?;
        write_framed(&ret.overtone, &self.overtones)?;
        if let Some(path) = &ret.cluster {
            let mut w = BufWriter::new(File::create(path)?);
            for c in &self.clusters {
                w.write_all(&c.to_ne_bytes())?;
            }
            w.flush()?;
        }
        Ok(ret)
    }
}

/// write `frames` to `path`, prefixing each frame with its index
pub fn write_framed(path: impl AsRef<Path>, frames: &[Vec<f32>]) -> io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    for (i, frame) in frames.iter().enumerate() {
        w.write_all(&(i as i32).to_ne_bytes())?;
        for v in frame {
            w.write_all(&v.to_ne_bytes())?;
        }
    }
    w.flush()
}

impl Trajectory for Frames {
    fn singles(&self) -> usize {
        self.singles
    }

    fn hamiltonian(
        &self,
        time: usize,
        dst: &mut Hamiltonian,
    ) -> Result<(), Error> {
        check_len(Stream::Hamiltonian, self.singles, dst.singles())?;
        let src = Self::frame(&self.hamiltonians, Stream::Hamiltonian, time)?;
        check_len(Stream::Hamiltonian, packed_len(self.singles), src.len())?;
        dst.as_mut_slice().copy_from_slice(src);
        Ok(())
    }

    fn dipole(
        &self,
        time: usize,
        axis: Axis,
        dst: &mut [f32],
    ) -> Result<(), Error> {
        check_len(Stream::Dipole, self.singles, dst.len())?;
        let src = Self::frame(&self.dipoles, Stream::Dipole, time)?;
        let skip = axis.index() * self.singles;
        dst.copy_from_slice(&src[skip..skip + self.singles]);
        Ok(())
    }

    fn anharmonicity(&self, time: usize, dst: &mut [f32]) -> Result<(), Error> {
        check_len(Stream::Anharmonicity, self.singles, dst.len())?;
        let src =
            Self::frame(&self.anharmonicities, Stream::Anharmonicity, time)?;
        dst.copy_from_slice(src);
        Ok(())
    }

    fn overtone_dipole(
        &self,
        time: usize,
        axis: Axis,
        dst: &mut [f32],
    ) -> Result<(), Error> {
        check_len(Stream::OvertoneDipole, self.singles, dst.len())?;
        let src = Self::frame(&self.overtones, Stream::OvertoneDipole, time)?;
        let skip = axis.index() * self.singles;
        dst.copy_from_slice(&src[skip..skip + self.singles]);
        Ok(())
    }
}

impl Clusters for Frames {
    fn cluster(&self, time: usize) -> Result<i32, Error> {
        self.clusters.get(time).copied().ok_or(Error::ShortBuffer {
            stream: Stream::Cluster,
            time,
        })
    }
}
