//! MPI processes through rsmpi.

use ::mpi::{
    collective::SystemOperation,
    environment::Universe,
    topology::{Color, SimpleCommunicator},
    traits::{Communicator as _, CommunicatorCollectives, Root},
};

use crate::{Communicator, Topology};

impl Communicator for SimpleCommunicator {
    fn rank(&self) -> usize {
        ::mpi::traits::Communicator::rank(self) as usize
    }

    fn size(&self) -> usize {
        ::mpi::traits::Communicator::size(self) as usize
    }

    fn broadcast(&self, root: usize, buf: &mut [i64]) {
        self.process_at_rank(root as i32).broadcast_into(buf);
    }

    fn scatter(&self, root: usize, send: Option<&[i32]>, recv: &mut [i32]) {
        let p = self.process_at_rank(root as i32);
        match send {
            Some(send) if Communicator::rank(self) == root => {
                p.scatter_into_root(send, recv)
            }
            _ => p.scatter_into(recv),
        }
    }

    fn reduce_sum(&self, root: usize, buf: &mut [f32]) {
        let p = self.process_at_rank(root as i32);
        if Communicator::rank(self) == root {
            // rsmpi has no in-place reduce, so the root's contribution costs
            // one temporary the size of `buf`
            let send = buf.to_vec();
            p.reduce_into_root(&send[..], buf, SystemOperation::sum());
        } else {
            p.reduce_into(&buf[..], SystemOperation::sum());
        }
    }

    fn barrier(&self) {
        CommunicatorCollectives::barrier(self);
    }

    fn abort(&self, code: i32) -> ! {
        ::mpi::traits::Communicator::abort(self, code)
    }
}

/// Initialize MPI, returning the environment guard, which must outlive every
/// communicator, or `None` if MPI was already initialized
pub fn initialize() -> Option<Universe> {
    ::mpi::initialize()
}

/// split the world of `universe` into shared-memory nodes and their leaders
pub fn topology(universe: &Universe) -> Topology<SimpleCommunicator> {
    let world = universe.world();
    let rank = ::mpi::traits::Communicator::rank(&world);
    let local = world.split_shared(rank);
    let color = if ::mpi::traits::Communicator::rank(&local) == 0 {
        Color::with_value(0)
    } else {
        Color::undefined()
    };
    let leaders = world.split_by_color_with_key(color, rank);
    Topology {
        world,
        local,
        leaders,
    }
}
