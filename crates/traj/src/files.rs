//! Binary trajectory files. Every frame starts with an `i32` frame number
//! followed by `f32` payload in native byte order:
//!
//! ```text
//! Hamiltonian     i32 + n(n+1)/2 f32 (packed upper triangle, row-major)
//!   or            i32 + n f32        (site energies, with a coupling file)
//! dipole          i32 + 3n f32       (x block, y block, z block)
//! anharmonicity   i32 + n f32
//! overtone dipole i32 + 3n f32
//! coupling        i32 + n(n+1)/2 f32 (a single frame)
//! cluster         i32                (no frame number)
//! ```
//!
//! Reads are positioned, so one handle can serve concurrent readers.

use std::{fs::File, io, os::unix::fs::FileExt, path::Path};

use log::debug;

use crate::{
    Axis, Clusters, Error, Hamiltonian, Stream, Trajectory, check_len,
    packed_len,
};

const WORD: usize = 4;

fn open(stream: Stream, path: impl AsRef<Path>) -> Result<File, Error> {
    let path = path.as_ref();
    File::open(path).map_err(|_| Error::FileNotFound {
        stream,
        path: path.display().to_string(),
    })
}

fn io_error(stream: Stream, time: usize, e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::ShortBuffer { stream, time }
    } else {
        Error::Io {
            stream,
            kind: e.kind(),
        }
    }
}

/// A framed binary stream with `width` floats after the frame number
#[derive(Debug)]
struct Framed {
    file: File,
    stream: Stream,
    width: usize,
}

impl Framed {
    fn open(
        stream: Stream,
        path: impl AsRef<Path>,
        width: usize,
    ) -> Result<Self, Error> {
        let path = path.as_ref();
        debug!("opening {stream} stream {}", path.display());
        Ok(Self {
            file: open(stream, path)?,
            stream,
            width,
        })
    }

    /// read `dst.len()` floats starting `skip` floats into frame `time`
    fn read(
        &self,
        time: usize,
        skip: usize,
        dst: &mut [f32],
    ) -> Result<(), Error> {
        let frame = WORD * (1 + self.width);
        let offset = (time * frame + WORD * (1 + skip)) as u64;
        let mut buf = vec![0u8; WORD * dst.len()];
        self.file
            .read_exact_at(&mut buf, offset)
            .map_err(|e| io_error(self.stream, time, e))?;
        for (d, c) in dst.iter_mut().zip(buf.chunks_exact(WORD)) {
            let mut b = [0u8; WORD];
            b.copy_from_slice(c);
            *d = f32::from_ne_bytes(b);
        }
        Ok(())
    }
}

/// Couplings and dipoles that stay fixed for the whole trajectory when the
/// energy stream only holds site energies
#[derive(Debug)]
struct Fixed {
    couplings: Hamiltonian,
    dipoles: Vec<f32>,
}

/// The trajectory streams of a calculation, opened once per process
#[derive(Debug)]
pub struct Files {
    singles: usize,
    energy: Framed,
    dipole: Framed,
    anharmonicity: Option<Framed>,
    overtone: Option<Framed>,
    fixed: Option<Fixed>,
}

impl Files {
    /// open the Hamiltonian and dipole streams for `singles` states, where
    /// every Hamiltonian frame holds the full packed matrix
    pub fn open(
        singles: usize,
        energy: impl AsRef<Path>,
        dipole: impl AsRef<Path>,
    ) -> Result<Self, Error> {
        Ok(Self {
            singles,
            energy: Framed::open(
                Stream::Hamiltonian,
                energy,
                packed_len(singles),
            )?,
            dipole: Framed::open(Stream::Dipole, dipole, 3 * singles)?,
            anharmonicity: None,
            overtone: None,
            fixed: None,
        })
    }

    /// open the Hamiltonian and dipole streams for `singles` states, where
    /// the energy stream holds only site energies. the couplings and the
    /// dipoles are taken from the coupling file and from the first dipole
    /// frame, respectively
    pub fn open_coupled(
        singles: usize,
        energy: impl AsRef<Path>,
        dipole: impl AsRef<Path>,
        coupling: impl AsRef<Path>,
    ) -> Result<Self, Error> {
        let coupling =
            Framed::open(Stream::Coupling, coupling, packed_len(singles))?;
        let mut couplings = Hamiltonian::zeros(singles);
        coupling.read(0, 0, couplings.as_mut_slice())?;

        let dipole = Framed::open(Stream::Dipole, dipole, 3 * singles)?;
        let mut dipoles = vec![0.0; 3 * singles];
        dipole.read(0, 0, &mut dipoles)?;

        Ok(Self {
            singles,
            energy: Framed::open(Stream::Hamiltonian, energy, singles)?,
            dipole,
            anharmonicity: None,
            overtone: None,
            fixed: Some(Fixed { couplings, dipoles }),
        })
    }

    /// additionally open the anharmonicity and overtone-dipole streams needed
    /// for two-exciton states
    pub fn with_doubles(
        mut self,
        anharmonicity: impl AsRef<Path>,
        overtone: impl AsRef<Path>,
    ) -> Result<Self, Error> {
        self.anharmonicity = Some(Framed::open(
            Stream::Anharmonicity,
            anharmonicity,
            self.singles,
        )?);
        self.overtone = Some(Framed::open(
            Stream::OvertoneDipole,
            overtone,
            3 * self.singles,
        )?);
        Ok(self)
    }

    fn doubles_stream<'a>(
        stream: &'a Option<Framed>,
        kind: Stream,
    ) -> Result<&'a Framed, Error> {
        stream.as_ref().ok_or(Error::FileNotFound {
            stream: kind,
            path: String::from("<not opened>"),
        })
    }
}

impl Trajectory for Files {
    fn singles(&self) -> usize {
        self.singles
    }

    fn hamiltonian(
        &self,
        time: usize,
        dst: &mut Hamiltonian,
    ) -> Result<(), Error> {
        check_len(Stream::Hamiltonian, self.singles, dst.singles())?;
        match &self.fixed {
            None => self.energy.read(time, 0, dst.as_mut_slice()),
            Some(Fixed { couplings, .. }) => {
                let mut sites = vec![0.0; self.singles];
                self.energy.read(time, 0, &mut sites)?;
                dst.as_mut_slice().copy_from_slice(couplings.as_slice());
                for (a, e) in sites.into_iter().enumerate() {
                    dst.set(a, a, e);
                }
                Ok(())
            }
        }
    }

    fn dipole(
        &self,
        time: usize,
        axis: Axis,
        dst: &mut [f32],
    ) -> Result<(), Error> {
        check_len(Stream::Dipole, self.singles, dst.len())?;
        let skip = axis.index() * self.singles;
        match &self.fixed {
            None => self.dipole.read(time, skip, dst),
            Some(Fixed { dipoles, .. }) => {
                dst.copy_from_slice(&dipoles[skip..skip + self.singles]);
                Ok(())
            }
        }
    }

    fn anharmonicity(&self, time: usize, dst: &mut [f32]) -> Result<(), Error> {
        check_len(Stream::Anharmonicity, self.singles, dst.len())?;
        Self::doubles_stream(&self.anharmonicity, Stream::Anharmonicity)?
            .read(time, 0, dst)
    }

    fn overtone_dipole(
        &self,
        time: usize,
        axis: Axis,
        dst: &mut [f32],
    ) -> Result<(), Error> {
        check_len(Stream::OvertoneDipole, self.singles, dst.len())?;
        Self::doubles_stream(&self.overtone, Stream::OvertoneDipole)?.read(
            time,
            axis.index() * self.singles,
            dst,
        )
    }
}

/// cluster labels, one `i32` per frame
#[derive(Debug)]
pub struct ClusterFile {
    file: File,
}

impl ClusterFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self {
            file: open(Stream::Cluster, path)?,
        })
    }
}

impl Clusters for ClusterFile {
    fn cluster(&self, time: usize) -> Result<i32, Error> {
        let mut b = [0u8; WORD];
        self.file
            .read_exact_at(&mut b, (time * WORD) as u64)
            .map_err(|e| io_error(Stream::Cluster, time, e))?;
        Ok(i32::from_ne_bytes(b))
    }
}
