use std::{error::Error as StdError, fmt::Display};

#[derive(Debug, PartialEq)]
pub enum Error {
    /// the trajectory is too short for a single sample of the requested
    /// delay windows
    InsufficientData { length: usize, needed: usize },

    /// a configuration file that could not be read or makes no sense
    Config(String),

    Trajectory(traj::Error),

    /// failure writing the results
    Io(String),
}

impl Error {
    /// Returns `true` if the error is [`InsufficientData`].
    ///
    /// [`InsufficientData`]: Error::InsufficientData
    #[must_use]
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }

    /// Returns `true` if the error is a short read from a trajectory stream.
    #[must_use]
    pub fn is_short_buffer(&self) -> bool {
        matches!(self, Self::Trajectory(e) if e.is_short_buffer())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InsufficientData { length, needed } => write!(
                f,
                "insufficient data to calculate spectrum: trajectory has \
                 {length} frames but at least {needed} are needed. lower the \
                 max times or provide a longer trajectory"
            ),
            Error::Config(s) => write!(f, "{s}"),
            Error::Trajectory(e) => write!(f, "{e}"),
            Error::Io(s) => write!(f, "{s}"),
        }
    }
}

impl StdError for Error {}

impl From<traj::Error> for Error {
    fn from(value: traj::Error) -> Self {
        Self::Trajectory(value)
    }
}
