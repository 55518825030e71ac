//! Configuration settings for a response calculation

use std::{
    fmt::{Debug, Display},
    path::Path,
};

use propagate::{Mode, Propagator};
use serde::{Deserialize, Serialize};

use crate::Error;

#[cfg(test)]
mod tests;

/// The pathways to include in the response. The names are those of the input
/// files, with short lowercase aliases
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Technique {
    /// every pathway
    #[serde(rename = "2DUVvis", alias = "full")]
    Full,

    /// ground-state bleach only
    #[serde(rename = "GBUVvis", alias = "gb")]
    Bleach,

    /// stimulated emission only
    #[serde(rename = "SEUVvis", alias = "se")]
    Emission,

    /// excited-state absorption only
    #[serde(rename = "EAUVvis", alias = "ea")]
    Absorption,

    /// bleach and emission without excited-state absorption
    #[serde(rename = "noEAUVvis", alias = "noea")]
    NoAbsorption,
}

impl Technique {
    pub const fn bleach(self) -> bool {
        matches!(self, Self::Full | Self::Bleach | Self::NoAbsorption)
    }

    pub const fn emission(self) -> bool {
        matches!(self, Self::Full | Self::Emission | Self::NoAbsorption)
    }

    pub const fn absorption(self) -> bool {
        matches!(self, Self::Full | Self::Absorption)
    }

    /// whether two-exciton states are involved
    pub const fn needs_doubles(self) -> bool {
        self.absorption()
    }
}

impl Display for Technique {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Technique::Full => "2DUVvis",
                Technique::Bleach => "GBUVvis",
                Technique::Emission => "SEUVvis",
                Technique::Absorption => "EAUVvis",
                Technique::NoAbsorption => "noEAUVvis",
            }
        )
    }
}

/// How the Hamiltonian trajectory is stored
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum HamiltonianKind {
    /// a full packed Hamiltonian per frame
    #[default]
    #[serde(alias = "full")]
    Full,

    /// site energies per frame, with couplings read once from a separate
    /// file and dipoles fixed to those of the first frame
    #[serde(alias = "coupling")]
    Coupling,
}

impl Display for HamiltonianKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HamiltonianKind::Full => write!(f, "full"),
            HamiltonianKind::Coupling => write!(f, "coupling"),
        }
    }
}

/// The propagation scheme can be given either by name or by its historical
/// index, 0 for diagonal and 1 for coupling
#[derive(Deserialize, Debug, PartialEq)]
#[serde(untagged)]
enum Propagation {
    Index(usize),
    Name(Mode),
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    /// The number of one-exciton states.
    singles: usize,

    /// The number of frames in the trajectory.
    length: usize,

    /// The lengths of the coherence, waiting, and detection windows in frames.
    tmax1: usize,
    tmax2: usize,
    tmax3: usize,

    /// Print strides along t1 and t3. Both default to 1.
    dt1: Option<usize>,
    dt3: Option<usize>,

    /// The time between frames in fs.
    deltat: f32,

    /// The number of frames between consecutive samples.
    sample: usize,

    /// The first sample to compute. Defaults to 0.
    begin: Option<usize>,

    /// One past the last sample to compute. 0 or missing means the last
    /// sample the trajectory can hold.
    end: Option<usize>,

    /// The population lifetime in fs.
    lifetime: f32,

    /// Either "diagonal" (0) or "coupling" (1).
    propagation: Propagation,

    /// One of "2DUVvis", "GBUVvis", "SEUVvis", "EAUVvis", or "noEAUVvis".
    technique: Technique,

    /// Only include samples whose cluster label matches this. Defaults to -1,
    /// which disables the cluster filter.
    cluster: Option<i32>,

    /// Either "full" or "coupling". Defaults to "full".
    hamiltonian: Option<HamiltonianKind>,

    /// A constant anharmonicity in cm⁻¹ with harmonic overtone dipoles. The
    /// default of 0 reads anharmonicities and overtone dipoles from their
    /// trajectories instead.
    anharmonicity: Option<f32>,

    /// Elements of the sparse two-exciton propagator with a squared magnitude
    /// at or below this are dropped. Defaults to 0.
    threshold: Option<f32>,

    /// Couplings smaller than this are skipped by Trotter propagation.
    /// Defaults to 0.
    coupling_cut: Option<f32>,

    /// The number of substeps per frame. Defaults to 1.
    trotter: Option<usize>,

    /// The frequency window in cm⁻¹. The Hamiltonian diagonal is shifted by
    /// its center.
    min1: Option<f32>,
    max1: Option<f32>,

    energy_file: Option<String>,
    dipole_file: Option<String>,
    anharmonic_file: Option<String>,
    overtone_file: Option<String>,
    coupling_file: Option<String>,
    cluster_file: Option<String>,

    /// The directory to write the response files to. Defaults to the current
    /// directory.
    output_dir: Option<String>,
}

/// Construct a full `Config` using [Config::load] on a TOML file or use
/// [Config::new] and the Builder pattern
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(try_from = "RawConfig")]
pub struct Config {
    /// number of one-exciton states
    pub singles: usize,

    /// number of frames in the trajectory
    pub length: usize,

    pub tmax1: usize,
    pub tmax2: usize,
    pub tmax3: usize,

    /// print stride along t1
    pub dt1: usize,

    /// print stride along t3
    pub dt3: usize,

    /// time between frames in fs
    pub deltat: f32,

    /// frames between samples
    pub sample: usize,

    pub begin: usize,

    /// 0 means up to the last sample
    pub end: usize,

    /// population lifetime in fs
    pub lifetime: f32,

    pub propagation: Mode,

    pub technique: Technique,

    /// requested cluster, -1 for all samples
    pub cluster: i32,

    pub hamiltonian: HamiltonianKind,

    /// constant anharmonicity, 0 to read it from the trajectory
    pub anharmonicity: f32,

    pub threshold: f32,

    pub coupling_cut: f32,

    pub trotter: usize,

    pub min1: f32,
    pub max1: f32,

    pub energy_file: String,
    pub dipole_file: String,
    pub anharmonic_file: String,
    pub overtone_file: String,
    pub coupling_file: String,
    pub cluster_file: String,

    pub output_dir: String,
}

impl TryFrom<RawConfig> for Config {
    type Error = String;

    fn try_from(rc: RawConfig) -> Result<Self, Self::Error> {
        let propagation = match rc.propagation {
            Propagation::Index(0) => Mode::Diagonal,
            Propagation::Index(1) => Mode::Coupling,
            Propagation::Index(i) => {
                return Err(format!("unknown propagation index {i}"));
            }
            Propagation::Name(mode) => mode,
        };
        Ok(Self {
            singles: rc.singles,
            length: rc.length,
            tmax1: rc.tmax1,
            tmax2: rc.tmax2,
            tmax3: rc.tmax3,
            dt1: rc.dt1.unwrap_or(1),
            dt3: rc.dt3.unwrap_or(1),
            deltat: rc.deltat,
            sample: rc.sample,
            begin: rc.begin.unwrap_or(0),
            end: rc.end.unwrap_or(0),
            lifetime: rc.lifetime,
            propagation,
            technique: rc.technique,
            cluster: rc.cluster.unwrap_or(-1),
            hamiltonian: rc.hamiltonian.unwrap_or_default(),
            anharmonicity: rc.anharmonicity.unwrap_or(0.0),
            threshold: rc.threshold.unwrap_or(0.0),
            coupling_cut: rc.coupling_cut.unwrap_or(0.0),
            trotter: rc.trotter.unwrap_or(1),
            min1: rc.min1.unwrap_or(0.0),
            max1: rc.max1.unwrap_or(0.0),
            energy_file: rc.energy_file.unwrap_or_else(|| "Energy.bin".into()),
            dipole_file: rc.dipole_file.unwrap_or_else(|| "Dipole.bin".into()),
            anharmonic_file: rc
                .anharmonic_file
                .unwrap_or_else(|| "Anharmonicity.bin".into()),
            overtone_file: rc
                .overtone_file
                .unwrap_or_else(|| "OvertoneDipole.bin".into()),
            coupling_file: rc
                .coupling_file
                .unwrap_or_else(|| "Coupling.bin".into()),
            cluster_file: rc
                .cluster_file
                .unwrap_or_else(|| "Cluster.bin".into()),
            output_dir: rc.output_dir.unwrap_or_else(|| ".".into()),
        })
    }
}

macro_rules! builders {
    ($t:ty => $($name: ident$(,)*)*) => {
        $(pub fn $name(mut self, v: $t) -> Self {
            self.$name = v;
            self
        })*
    }
}

impl Config {
    /// Construct a [Config] for `singles` states, a trajectory of `length`
    /// frames, and the delay windows `tmax`, with default values for `deltat`
    /// (1 fs), `sample` (1), `lifetime` (1000 fs), `propagation`
    /// ([Mode::Diagonal]), and everything the input file makes optional
    pub fn new(
        singles: usize,
        length: usize,
        tmax: [usize; 3],
        technique: Technique,
    ) -> Self {
        let [tmax1, tmax2, tmax3] = tmax;
        Self {
            singles,
            length,
            tmax1,
            tmax2,
            tmax3,
            dt1: 1,
            dt3: 1,
            deltat: 1.0,
            sample: 1,
            begin: 0,
            end: 0,
            lifetime: 1000.0,
            propagation: Mode::Diagonal,
            technique,
            cluster: -1,
            hamiltonian: HamiltonianKind::Full,
            anharmonicity: 0.0,
            threshold: 0.0,
            coupling_cut: 0.0,
            trotter: 1,
            min1: 0.0,
            max1: 0.0,
            energy_file: "Energy.bin".into(),
            dipole_file: "Dipole.bin".into(),
            anharmonic_file: "Anharmonicity.bin".into(),
            overtone_file: "OvertoneDipole.bin".into(),
            coupling_file: "Coupling.bin".into(),
            cluster_file: "Cluster.bin".into(),
            output_dir: ".".into(),
        }
    }

    builders!(usize => dt1, dt3, sample, begin, end, trotter);

    builders!(f32 => deltat, lifetime, anharmonicity, threshold, coupling_cut);

    builders!(i32 => cluster);

    builders!(Mode => propagation);

    builders!(Technique => technique);

    builders!(HamiltonianKind => hamiltonian);

    builders!(String => energy_file, dipole_file, anharmonic_file,
              overtone_file, coupling_file, cluster_file, output_dir);

    /// set the frequency window
    pub fn window(mut self, min1: f32, max1: f32) -> Self {
        self.min1 = min1;
        self.max1 = max1;
        self
    }

    /// load a [Config] from the TOML file specified by `filename` and
    /// validate it
    pub fn load<P>(filename: P) -> Result<Self, Error>
    where
        P: AsRef<Path> + Debug,
    {
        let contents = std::fs::read_to_string(&filename).map_err(|e| {
            Error::Config(format!(
                "failed to load config file {filename:?} with {e}"
            ))
        })?;
        let ret: Self = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!(
                "failed to deserialize config file {filename:?} with {e}"
            ))
        })?;

        ret.validate()?;

        Ok(ret)
    }

    /// check that the settings in `self` make any sense
    pub fn validate(&self) -> Result<(), Error> {
        let fail = |s: &str| Err(Error::Config(s.to_owned()));
        if self.singles == 0 {
            return fail("singles must be at least 1");
        }
        if self.tmax1 == 0 || self.tmax3 == 0 {
            return fail("tmax1 and tmax3 must be at least 1");
        }
        if self.dt1 == 0 || self.dt3 == 0 {
            return fail("dt1 and dt3 must be at least 1");
        }
        if self.sample == 0 {
            return fail("sample must be at least 1");
        }
        if self.trotter == 0 {
            return fail("trotter must be at least 1");
        }
        if self.deltat <= 0.0 || self.lifetime <= 0.0 {
            return fail("deltat and lifetime must be positive");
        }
        if self.end != 0 && self.end < self.begin {
            return Err(Error::Config(format!(
                "end ({}) comes before begin ({})",
                self.end, self.begin
            )));
        }
        Ok(())
    }

    /// the shift applied to the Hamiltonian diagonal, the center of the
    /// frequency window
    pub fn shift(&self) -> f32 {
        (self.max1 + self.min1) / 2.0
    }

    /// the requested cluster, if samples are filtered by cluster
    pub fn cluster_filter(&self) -> Option<i32> {
        (self.cluster != -1).then_some(self.cluster)
    }

    /// whether anharmonicities and overtone dipoles have to be read from
    /// their trajectories
    pub fn reads_doubles(&self) -> bool {
        self.technique.needs_doubles() && self.anharmonicity == 0.0
    }

    pub fn propagator(&self) -> Propagator {
        Propagator {
            deltat: self.deltat,
            trotter: self.trotter,
            coupling_cut: self.coupling_cut,
            threshold: self.threshold,
        }
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Config {
            singles,
            length,
            tmax1,
            tmax2,
            tmax3,
            dt1,
            dt3,
            deltat,
            sample,
            begin,
            end,
            lifetime,
            propagation,
            technique,
            cluster,
            hamiltonian,
            anharmonicity,
            threshold,
            coupling_cut,
            trotter,
            min1,
            max1,
            energy_file,
            dipole_file,
            anharmonic_file,
            overtone_file,
            coupling_file,
            cluster_file,
            output_dir,
        } = self;
        write!(
            f,
            "
Configuration Options:
singles = {singles}
length = {length}
tmax1 = {tmax1}
tmax2 = {tmax2}
tmax3 = {tmax3}
dt1 = {dt1}
dt3 = {dt3}
deltat = {deltat}
sample = {sample}
begin = {begin}
end = {end}
lifetime = {lifetime}
propagation = {propagation}
technique = {technique}
cluster = {cluster}
hamiltonian = {hamiltonian}
anharmonicity = {anharmonicity}
threshold = {threshold}
coupling_cut = {coupling_cut}
trotter = {trotter}
min1 = {min1}
max1 = {max1}
energy_file = {energy_file}
dipole_file = {dipole_file}
anharmonic_file = {anharmonic_file}
overtone_file = {overtone_file}
coupling_file = {coupling_file}
cluster_file = {cluster_file}
output_dir = {output_dir}
"
        )
    }
}
