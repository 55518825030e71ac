//! Groups of threads in one process standing in for separate processes.
//!
//! Each collective is a write phase and a read phase separated by a barrier,
//! closed by a second barrier so that no member can start the next collective
//! while another is still reading the slots of this one.

use std::{
    any::Any,
    sync::{Arc, Barrier, Mutex, PoisonError},
    thread,
};

use log::error;

use crate::{Communicator, Topology};

type Slot = Option<Box<dyn Any + Send>>;

#[derive(Debug)]
struct Hub {
    size: usize,
    barrier: Barrier,
    slots: Mutex<Vec<Slot>>,
}

impl Hub {
    fn new(size: usize) -> Arc<Self> {
        Arc::new(Self {
            size,
            barrier: Barrier::new(size),
            slots: Mutex::new((0..size).map(|_| None).collect()),
        })
    }

    fn put<T: Send + 'static>(&self, rank: usize, data: Vec<T>) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots[rank] = Some(Box::new(data));
    }

    /// run `f` on the data posted by `rank`, which must be a `Vec<T>`
    fn with<T: 'static, R>(&self, rank: usize, f: impl FnOnce(&[T]) -> R) -> R {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let data = slots[rank]
            .as_ref()
            .and_then(|b| b.downcast_ref::<Vec<T>>());
        match data {
            Some(data) => f(data),
            None => panic!("rank {rank} did not post to this collective"),
        }
    }

    fn clear(&self, rank: usize) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots[rank] = None;
    }
}

/// One member of a thread group
#[derive(Clone, Debug)]
pub struct Member {
    rank: usize,
    hub: Arc<Hub>,
}

impl Communicator for Member {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.hub.size
    }

    fn broadcast(&self, root: usize, buf: &mut [i64]) {
        if self.rank == root {
            self.hub.put(root, buf.to_vec());
        }
        self.hub.barrier.wait();
        if self.rank != root {
            self.hub.with(root, |data: &[i64]| buf.copy_from_slice(data));
        }
        self.hub.barrier.wait();
        if self.rank == root {
            self.hub.clear(root);
        }
    }

    fn scatter(&self, root: usize, send: Option<&[i32]>, recv: &mut [i32]) {
        if self.rank == root {
            let send = send.unwrap_or_default();
            assert_eq!(
                send.len(),
                recv.len() * self.hub.size,
                "scatter buffer does not fill the group"
            );
            self.hub.put(root, send.to_vec());
        }
        self.hub.barrier.wait();
        let n = recv.len();
        let start = self.rank * n;
        self.hub.with(root, |data: &[i32]| {
            recv.copy_from_slice(&data[start..start + n])
        });
        self.hub.barrier.wait();
        if self.rank == root {
            self.hub.clear(root);
        }
    }

    fn reduce_sum(&self, root: usize, buf: &mut [f32]) {
        if self.rank != root {
            self.hub.put(self.rank, buf.to_vec());
        }
        self.hub.barrier.wait();
        if self.rank == root {
            for r in (0..self.hub.size).filter(|&r| r != root) {
                self.hub.with(r, |data: &[f32]| {
                    for (b, d) in buf.iter_mut().zip(data) {
                        *b += d;
                    }
                });
                self.hub.clear(r);
            }
        }
        self.hub.barrier.wait();
    }

    fn barrier(&self) {
        self.hub.barrier.wait();
    }

    fn abort(&self, code: i32) -> ! {
        error!("rank {} aborting the thread group with {code}", self.rank);
        std::process::exit(code)
    }
}

/// Run `f` on `size` threads forming one world group, with consecutive runs
/// of `local_size` ranks sharing a node. Returns the results of `f` in rank
/// order.
pub fn launch<F, R>(size: usize, local_size: usize, f: F) -> Vec<R>
where
    F: Fn(Topology<Member>) -> R + Sync,
    R: Send,
{
    let size = size.max(1);
    let local_size = local_size.clamp(1, size);
    let nodes = size.div_ceil(local_size);

    let world = Hub::new(size);
    let locals: Vec<_> = (0..nodes)
        .map(|node| Hub::new(local_size.min(size - node * local_size)))
        .collect();
    let leaders = Hub::new(nodes);

    let topologies: Vec<_> = (0..size)
        .map(|rank| {
            let node = rank / local_size;
            let local_rank = rank % local_size;
            Topology {
                world: Member {
                    rank,
                    hub: world.clone(),
                },
                local: Member {
                    rank: local_rank,
                    hub: locals[node].clone(),
                },
                leaders: (local_rank == 0).then(|| Member {
                    rank: node,
                    hub: leaders.clone(),
                }),
            }
        })
        .collect();

    let f = &f;
    thread::scope(|s| {
        let handles: Vec<_> = topologies
            .into_iter()
            .map(|t| s.spawn(move || f(t)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    })
}
