//! Running a calculation on a process group.
//!
//! Every member computes the sample count on its own, the root builds the work
//! set and scatters it, each member accumulates its share into private grids,
//! and the grids are summed onto the root in two tiers. Only the root returns
//! a result.

use std::time::Instant;

use comm::{Communicator, Topology};
use log::{debug, info};
use traj::{ClusterFile, Clusters, Files, Trajectory};

use crate::{
    Error,
    config::{Config, HamiltonianKind},
    decay::Decay,
    grids::ResponseSet,
    output,
    response::Accumulator,
    workset::{distribute, plan, total_samples},
};

#[cfg(test)]
mod tests;

/// The normalized result held by the root
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    /// the sample count the grids were divided by
    pub samples: usize,
    pub cluster_matches: usize,
    pub grids: ResponseSet,
}

/// Compute the response of the samples selected by `config` over `topology`.
/// `clusters` is only consulted on the root. Returns `Some` on the root and
/// `None` everywhere else.
pub fn compute<C, T, K>(
    config: &Config,
    topology: &Topology<C>,
    trajectory: &T,
    clusters: Option<&K>,
) -> Result<Option<Summary>, Error>
where
    C: Communicator,
    T: Trajectory,
    K: Clusters,
{
    config.validate()?;
    let total = total_samples(config)?;
    let work = if topology.is_root() {
        info!("{total} samples fit in the trajectory");
        info!("shifting frequencies by {:.2} cm-1", config.shift());
        Some(plan(config, total, clusters)?)
    } else {
        None
    };
    let share = distribute(&topology.world, work.as_ref());
    let rank = topology.world.rank();
    debug!(
        "rank {rank} received {} of {} slots",
        share.items.len(),
        share.slots
    );

    let decay = Decay::from_config(config);
    let acc = Accumulator::new(config, trajectory, &decay);
    let mut grids = ResponseSet::zeros(config.tmax3, config.tmax1);
    for &item in &share.items {
        let start = Instant::now();
        debug!(
            "rank {rank} starting sample {} direction {}",
            item.sample, item.pol
        );
        acc.add(item, &mut grids)?;
        debug!(
            "rank {rank} finished sample {} direction {} in {:.3} s",
            item.sample,
            item.pol,
            start.elapsed().as_secs_f64()
        );
    }

    topology.reduce(grids.slices_mut());
    if !topology.is_root() {
        return Ok(None);
    }

    if let Some(cluster) = config.cluster_filter() {
        info!(
            "{} samples matched cluster {cluster}",
            share.cluster_matches
        );
    }
    info!("normalizing by {} samples", share.samples);
    grids.normalize(share.samples);
    Ok(Some(Summary {
        samples: share.samples,
        cluster_matches: share.cluster_matches,
        grids,
    }))
}

/// open the trajectory files named in `config`
pub fn open(config: &Config) -> Result<Files, Error> {
    let files = match config.hamiltonian {
        HamiltonianKind::Full => Files::open(
            config.singles,
            &config.energy_file,
            &config.dipole_file,
        )?,
        HamiltonianKind::Coupling => Files::open_coupled(
            config.singles,
            &config.energy_file,
            &config.dipole_file,
            &config.coupling_file,
        )?,
    };
    if config.reads_doubles() {
        return Ok(files
            .with_doubles(&config.anharmonic_file, &config.overtone_file)?);
    }
    Ok(files)
}

/// Open the trajectory, compute the response, and write the tables from the
/// root
pub fn run<C: Communicator>(
    config: &Config,
    topology: &Topology<C>,
) -> Result<(), Error> {
    let files = open(config)?;
    let clusters = match config.cluster_filter() {
        Some(_) if topology.is_root() => {
            Some(ClusterFile::open(&config.cluster_file)?)
        }
        _ => None,
    };
    let Some(summary) = compute(config, topology, &files, clusters.as_ref())?
    else {
        return Ok(());
    };
    output::write(config, &summary.grids)?;
    info!("wrote output to {}", config.output_dir);
    Ok(())
}
