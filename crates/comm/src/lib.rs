//! Process groups for distributing a calculation.
//!
//! A [Communicator] is the handful of collective operations the response
//! engine needs. Every member of a group must call the same collectives in the
//! same order. [Topology] arranges a world group into node-local groups and a
//! group of node leaders so that reductions happen in two tiers.
//!
//! Three backends are provided: [Solo] for a single process, [threads] for a
//! group of threads inside one process, and, with the `mpi` feature, real MPI
//! processes.

#[cfg(feature = "mpi")]
pub mod mpi;
pub mod threads;

#[cfg(test)]
mod tests;

pub trait Communicator {
    /// this member's rank in `0..size()`
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// copy `buf` on `root` into `buf` on every other member
    fn broadcast(&self, root: usize, buf: &mut [i64]);

    /// split `send`, which is only read on `root` and must hold `size() *
    /// recv.len()` values, into equal consecutive chunks and deliver chunk `r`
    /// to the `recv` of rank `r`
    fn scatter(&self, root: usize, send: Option<&[i32]>, recv: &mut [i32]);

    /// sum `buf` elementwise over the group, leaving the total in `buf` on
    /// `root`. `buf` on the other members is left untouched
    fn reduce_sum(&self, root: usize, buf: &mut [f32]);

    fn barrier(&self);

    /// terminate every member of the group with exit status `code`
    fn abort(&self, code: i32) -> !;
}

/// The single-member group
#[derive(Clone, Copy, Debug, Default)]
pub struct Solo;

impl Communicator for Solo {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn broadcast(&self, _root: usize, _buf: &mut [i64]) {}

    fn scatter(&self, _root: usize, send: Option<&[i32]>, recv: &mut [i32]) {
        if let Some(send) = send {
            recv.copy_from_slice(&send[..recv.len()]);
        }
    }

    fn reduce_sum(&self, _root: usize, _buf: &mut [f32]) {}

    fn barrier(&self) {}

    fn abort(&self, code: i32) -> ! {
        std::process::exit(code)
    }
}

/// The world group split into node-local groups. The first member of each
/// node-local group is that node's leader, and the leaders form a group of
/// their own
#[derive(Debug)]
pub struct Topology<C> {
    pub world: C,

    /// the members sharing this member's node
    pub local: C,

    /// the group of node leaders, present only on leaders
    pub leaders: Option<C>,
}

impl Topology<Solo> {
    pub fn solo() -> Self {
        Self {
            world: Solo,
            local: Solo,
            leaders: Some(Solo),
        }
    }
}

impl<C: Communicator> Topology<C> {
    /// whether this member is rank 0 of the world group
    pub fn is_root(&self) -> bool {
        self.world.rank() == 0
    }

    /// whether this member leads its node-local group
    pub fn is_leader(&self) -> bool {
        self.leaders.is_some()
    }

    /// Sum every buffer in `bufs` over the whole world group, first within
    /// each node and then across node leaders. The totals end up on the world
    /// root; other members are left with partial sums.
    pub fn reduce<'a>(&self, bufs: impl IntoIterator<Item = &'a mut [f32]>) {
        let mut bufs: Vec<_> = bufs.into_iter().collect();
        for buf in bufs.iter_mut() {
            self.local.reduce_sum(0, buf);
        }
        self.local.barrier();
        if let Some(leaders) = &self.leaders {
            for buf in bufs.iter_mut() {
                leaders.reduce_sum(0, buf);
            }
            leaders.barrier();
        }
        self.world.barrier();
    }
}
