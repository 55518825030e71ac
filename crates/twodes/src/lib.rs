//! Third-order nonlinear optical response from exciton trajectories.
//!
//! Samples of a trajectory are split into (sample, polarization direction)
//! work items and scattered over a process group. Each member accumulates the
//! rephasing and non-rephasing responses of the bleach, emission, and
//! absorption pathways into twelve grids, which are summed onto the root,
//! normalized, and written as six tables.

pub mod config;
pub mod decay;
pub mod engine;
mod error;
pub mod grids;
pub mod output;
pub mod polar;
pub mod response;
pub mod workset;

pub use error::Error;

/// print the formatted message to stderr and exit with status 1
#[macro_export]
macro_rules! die {
    ($($t:tt)*) => {{
        eprintln!($($t)*);
        std::process::exit(1);
    }};
}

/// call `rayon::ThreadPoolBuilder` to set `num_threads` to `n`. Discards the
/// error returned by `build_global` if the thread pool has already been
/// initialized
pub fn max_threads(n: usize) {
    let _ = rayon::ThreadPoolBuilder::new()
        .num_threads(n)
        .build_global();
}
