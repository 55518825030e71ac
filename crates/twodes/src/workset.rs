//! Static partitioning of the (sample, polarization direction) work items over
//! the world group.

use comm::Communicator;
use log::{debug, info};
use traj::Clusters;

use crate::{Error, config::Config, polar::DIRECTIONS};

/// marks a padding slot in a packed work set
pub const SKIP: i32 = -1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkItem {
    pub sample: usize,
    pub pol: usize,
}

/// The work set built on the root
#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    pub items: Vec<WorkItem>,

    /// the samples that remain after cluster filtering, at least 1
    pub samples: usize,

    /// samples whose cluster matched the filter
    pub cluster_matches: usize,

    /// the resolved sample range
    pub begin: usize,
    pub end: usize,
}

/// The share of the work set received by one member of the world group
#[derive(Clone, Debug, PartialEq)]
pub struct Share {
    /// this member's items, with padding removed
    pub items: Vec<WorkItem>,

    /// number of slots every member received, padding included
    pub slots: usize,

    pub samples: usize,
    pub cluster_matches: usize,
}

/// the number of samples that fit in the trajectory
pub fn total_samples(config: &Config) -> Result<usize, Error> {
    let needed = config.tmax1 + config.tmax2 + config.tmax3 + 1;
    if config.length < needed {
        return Err(Error::InsufficientData {
            length: config.length,
            needed,
        });
    }
    Ok((config.length - needed) / config.sample + 1)
}

/// The first frame of the waiting time for `sample`, which is also the frame
/// whose cluster label decides whether the sample is kept
#[inline]
pub fn waiting_start(config: &Config, sample: usize) -> usize {
    sample * config.sample + config.tmax1
}

/// Enumerate the work items for the samples in the configured range, dropping
/// samples whose cluster does not match the filter
pub fn plan(
    config: &Config,
    total: usize,
    clusters: Option<&impl Clusters>,
) -> Result<Plan, Error> {
    let begin = config.begin;
    let end = if config.end == 0 { total } else { config.end };
    if begin > end {
        return Err(Error::Config(format!(
            "begin ({begin}) is past the last sample ({end})"
        )));
    }
    let filter = match (config.cluster_filter(), clusters) {
        (Some(want), Some(c)) => Some((want, c)),
        (Some(_), None) => {
            return Err(Error::Config(
                "cluster filter requested without cluster labels".to_owned(),
            ));
        }
        (None, _) => None,
    };

    let mut samples = end - begin;
    let mut cluster_matches = 0;
    let mut items = Vec::with_capacity(DIRECTIONS * samples);
    for sample in begin..end {
        if let Some((want, clusters)) = filter {
            let got = clusters.cluster(waiting_start(config, sample))?;
            if got != want {
                debug!("skipping sample {sample}, incorrect cluster");
                samples -= 1;
                continue;
            }
            cluster_matches += 1;
        }
        items.extend((0..DIRECTIONS).map(|pol| WorkItem { sample, pol }));
    }

    Ok(Plan {
        items,
        samples: samples.max(1),
        cluster_matches,
        begin,
        end,
    })
}

impl Plan {
    /// the number of slots each of `size` members receives
    pub fn share(&self, size: usize) -> usize {
        self.items.len().div_ceil(size)
    }

    /// flatten the items into `(sample, pol)` pairs, padded with [SKIP] to
    /// `size` equal shares
    pub fn pack(&self, size: usize) -> Vec<i32> {
        let slots = self.share(size) * size;
        let mut ret = Vec::with_capacity(2 * slots);
        for item in &self.items {
            ret.extend([item.sample as i32, item.pol as i32]);
        }
        ret.resize(2 * slots, SKIP);
        ret
    }
}

/// Broadcast the sample counts and share size from the root, which holds
/// `plan`, and scatter the packed work set over `world`
pub fn distribute<C: Communicator>(world: &C, plan: Option<&Plan>) -> Share {
    let mut counts = [0i64; 3];
    if let Some(plan) = plan {
        counts = [
            plan.samples as i64,
            plan.cluster_matches as i64,
            plan.share(world.size()) as i64,
        ];
        info!("begin sample: {}, end sample: {}", plan.begin, plan.end);
    }
    world.broadcast(0, &mut counts);
    let [samples, cluster_matches, slots] = counts.map(|c| c as usize);

    let packed = plan.map(|p| p.pack(world.size()));
    let mut recv = vec![SKIP; 2 * slots];
    world.scatter(0, packed.as_deref(), &mut recv);

    let items = recv
        .chunks_exact(2)
        .filter(|c| c[0] != SKIP && c[1] != SKIP)
        .map(|c| WorkItem {
            sample: c[0] as usize,
            pol: c[1] as usize,
        })
        .collect();
    Share {
        items,
        slots,
        samples,
        cluster_matches,
    }
}

#[cfg(test)]
mod tests;
