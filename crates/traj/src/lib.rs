//! Read access to the molecular-dynamics trajectories that drive a response
//! calculation: Hamiltonian snapshots, one-exciton transition dipoles,
//! anharmonicities, overtone dipoles, and cluster labels.
//!
//! Every read is addressed by an absolute frame index, so a [Trajectory] can be
//! shared between threads without any cursor state.

use std::{error::Error as StdError, fmt::Display, io::ErrorKind};

pub mod files;
pub mod frames;

pub use files::{ClusterFile, Files};
pub use frames::Frames;


/// index of the element `(a, b)` in a packed upper triangle of an `n`x`n`
/// symmetric matrix. the order of `a` and `b` does not matter
#[inline]
pub const fn packed_index(a: usize, b: usize, n: usize) -> usize {
    let (a, b) = if a > b { (b, a) } else { (a, b) };
    a * n + b - (a * (a + 1)) / 2
}

/// number of elements in the packed upper triangle of an `n`x`n` matrix
#[inline]
pub const fn packed_len(n: usize) -> usize {
    n * (n + 1) / 2
}

/// the trajectory streams, used for diagnostics
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stream {
    Hamiltonian,
    Dipole,
    Anharmonicity,
    OvertoneDipole,
    Coupling,
    Cluster,
}

impl Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Stream::Hamiltonian => "Hamiltonian",
                Stream::Dipole => "dipole",
                Stream::Anharmonicity => "anharmonicity",
                Stream::OvertoneDipole => "overtone dipole",
                Stream::Coupling => "coupling",
                Stream::Cluster => "cluster",
            }
        )
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// a required trajectory file could not be opened
    FileNotFound { stream: Stream, path: String },

    /// the stream ended before frame `time` could be read completely
    ShortBuffer { stream: Stream, time: usize },

    /// any other I/O failure
    Io { stream: Stream, kind: ErrorKind },

    /// a destination buffer or a frame did not match the number of states
    Shape {
        stream: Stream,
        want: usize,
        got: usize,
    },
}

impl Error {
    /// Returns `true` if the error is [`ShortBuffer`].
    ///
    /// [`ShortBuffer`]: Error::ShortBuffer
    #[must_use]
    pub fn is_short_buffer(&self) -> bool {
        matches!(self, Self::ShortBuffer { .. })
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::FileNotFound { stream, path } => {
                write!(f, "{stream} file {path} not found")
            }
            Error::ShortBuffer { stream, time } => write!(
                f,
                "{stream} trajectory file too short, could not fill buffer \
                 at ITIME {time}"
            ),
            Error::Io { stream, kind } => {
                write!(f, "failed to read {stream} trajectory: {kind}")
            }
            Error::Shape { stream, want, got } => write!(
                f,
                "{stream} data has {got} elements where {want} were expected"
            ),
        }
    }
}

impl StdError for Error {}

/// Cartesian axis selecting one block of a dipole frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        };
        write!(f, "{c}")
    }
}

/// one-exciton Hamiltonian stored as the packed upper triangle, in cm⁻¹
#[derive(Clone, Debug, PartialEq)]
pub struct Hamiltonian {
    singles: usize,
    data: Vec<f32>,
}

impl Hamiltonian {
    pub fn zeros(singles: usize) -> Self {
        Self {
            singles,
            data: vec![0.0; packed_len(singles)],
        }
    }

    /// build a Hamiltonian from its packed upper triangle. fails if `data` is
    /// not `singles * (singles + 1) / 2` long
    pub fn from_packed(singles: usize, data: Vec<f32>) -> Result<Self, Error> {
        if data.len() != packed_len(singles) {
            return Err(Error::Shape {
                stream: Stream::Hamiltonian,
                want: packed_len(singles),
                got: data.len(),
            });
        }
        Ok(Self { singles, data })
    }

    #[inline]
    pub fn singles(&self) -> usize {
        self.singles
    }

    #[inline]
    pub fn get(&self, a: usize, b: usize) -> f32 {
        self.data[packed_index(a, b, self.singles)]
    }

    #[inline]
    pub fn set(&mut self, a: usize, b: usize, v: f32) {
        self.data[packed_index(a, b, self.singles)] = v;
    }

    /// subtract `shift` from every site energy, centering the spectrum in the
    /// rotating frame
    pub fn shift_diagonal(&mut self, shift: f32) {
        for a in 0..self.singles {
            self.data[packed_index(a, a, self.singles)] -= shift;
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

/// The absolute-time-indexed read contract for the trajectory streams. All of
/// the destination slices must hold exactly `singles()` elements.
pub trait Trajectory: Sync {
    /// the number of one-exciton states in every frame
    fn singles(&self) -> usize;

    /// read the Hamiltonian of frame `time` into `dst`
    fn hamiltonian(
        &self,
        time: usize,
        dst: &mut Hamiltonian,
    ) -> Result<(), Error>;

    /// read the `axis` component of the transition dipoles of frame `time`
    fn dipole(
        &self,
        time: usize,
        axis: Axis,
        dst: &mut [f32],
    ) -> Result<(), Error>;

    /// read the diagonal anharmonicities of frame `time`
    fn anharmonicity(&self, time: usize, dst: &mut [f32]) -> Result<(), Error>;

    /// read the `axis` component of the overtone (0 -> 2) transition dipoles
    /// of frame `time`
    fn overtone_dipole(
        &self,
        time: usize,
        axis: Axis,
        dst: &mut [f32],
    ) -> Result<(), Error>;
}

/// cluster membership lookup by absolute frame index
pub trait Clusters {
    fn cluster(&self, time: usize) -> Result<i32, Error>;
}

/// check that `dst` matches `want` before filling it
pub(crate) fn check_len(
    stream: Stream,
    want: usize,
    got: usize,
) -> Result<(), Error> {
    if want != got {
        return Err(Error::Shape { stream, want, got });
    }
    Ok(())
}
