//! Bounded pool of pre-established client connections.
//!
//! The pool owns a fixed array of clients plus a mutex-guarded queue of
//! free slot indices. [`ClientPool::acquire`] blocks on a condition
//! variable until a slot is free; dropping the returned guard re-queues
//! the slot and wakes exactly one waiter. There is no fairness guarantee
//! among waiters, and no partial-pool fallback: the first connection
//! failure during construction aborts the run.

use crate::error::BenchError;
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard};

/// A fixed-size pool of clients with blocking checkout.
pub struct ClientPool<C> {
    slots: Vec<Mutex<C>>,
    free: Mutex<VecDeque<usize>>,
    available: Condvar,
}

impl<C> ClientPool<C> {
    /// Build a pool of `size` clients, connecting each one eagerly.
    ///
    /// `connect` is invoked once per slot with the slot index. Any error
    /// is fatal; no workers have started at this point.
    pub fn connect<F>(size: usize, connect: F) -> Result<Self, BenchError>
    where
        F: Fn(usize) -> Result<C, BenchError>,
    {
        let mut slots = Vec::with_capacity(size);
        for index in 0..size {
            let client = connect(index).map_err(|source| BenchError::Connect {
                index,
                source: Box::new(source),
            })?;
            slots.push(Mutex::new(client));
        }
        Ok(Self {
            slots,
            free: Mutex::new((0..size).collect()),
            available: Condvar::new(),
        })
    }

    /// Total number of slots.
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots not currently checked out.
    pub fn available(&self) -> usize {
        self.free.lock().expect("pool free list poisoned").len()
    }

    /// Check out a client, blocking until a slot is free.
    pub fn acquire(&self) -> PooledClient<'_, C> {
        let mut free = self.free.lock().expect("pool free list poisoned");
        while free.is_empty() {
            free = self
                .available
                .wait(free)
                .expect("pool free list poisoned");
        }
        let index = free.pop_front().expect("free list non-empty after wait");
        drop(free);

        // The free list guarantees exclusive ownership of the slot, so
        // this lock is never contended.
        let client = self.slots[index].lock().expect("pool slot poisoned");
        PooledClient {
            pool: self,
            index,
            client: Some(client),
        }
    }

    fn release(&self, index: usize) {
        let mut free = self.free.lock().expect("pool free list poisoned");
        free.push_back(index);
        drop(free);
        self.available.notify_one();
    }
}

/// RAII guard for a checked-out client. Dropping it returns the slot to
/// the pool and wakes one waiter.
pub struct PooledClient<'a, C> {
    pool: &'a ClientPool<C>,
    index: usize,
    client: Option<MutexGuard<'a, C>>,
}

impl<C> PooledClient<'_, C> {
    /// Index of the held slot.
    pub fn slot(&self) -> usize {
        self.index
    }
}

impl<C> Deref for PooledClient<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.client.as_ref().expect("client present until drop")
    }
}

impl<C> DerefMut for PooledClient<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.client.as_mut().expect("client present until drop")
    }
}

impl<C> Drop for PooledClient<'_, C> {
    fn drop(&mut self) {
        // Release the slot lock before re-queueing the index.
        self.client.take();
        self.pool.release(self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_connect_builds_full_pool() {
        let pool = ClientPool::connect(4, |index| Ok(index)).unwrap();
        assert_eq!(pool.size(), 4);
        assert_eq!(pool.available(), 4);
    }

    #[test]
    fn test_connect_failure_is_fatal() {
        let result: Result<ClientPool<usize>, _> = ClientPool::connect(4, |index| {
            if index == 2 {
                Err(BenchError::Config("refused".into()))
            } else {
                Ok(index)
            }
        });
        match result {
            Err(BenchError::Connect { index, .. }) => assert_eq!(index, 2),
            other => panic!("expected connect error, got {:?}", other.map(|p| p.size())),
        }
    }

    #[test]
    fn test_acquire_and_release_preserve_slot_count() {
        let pool = ClientPool::connect(2, |index| Ok(index)).unwrap();

        let first = pool.acquire();
        let second = pool.acquire();
        assert_eq!(pool.available(), 0);

        drop(first);
        assert_eq!(pool.available(), 1);
        drop(second);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_released_slot_wakes_one_waiter() {
        let pool = ClientPool::connect(1, |index| Ok(index)).unwrap();

        std::thread::scope(|scope| {
            let guard = pool.acquire();
            let handle = scope.spawn(|| {
                let reacquired = pool.acquire();
                *reacquired
            });
            std::thread::sleep(Duration::from_millis(50));
            drop(guard);
            assert_eq!(handle.join().unwrap(), 0);
        });
    }

    #[test]
    fn test_outstanding_never_exceeds_pool_size() {
        const POOL_SIZE: usize = 3;
        const WORKERS: usize = 8;
        const ITERATIONS: usize = 200;

        let pool = ClientPool::connect(POOL_SIZE, |index| Ok(index)).unwrap();
        let outstanding = AtomicUsize::new(0);
        let max_seen = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..WORKERS {
                scope.spawn(|| {
                    for _ in 0..ITERATIONS {
                        let _client = pool.acquire();
                        let current = outstanding.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(current, Ordering::SeqCst);
                        outstanding.fetch_sub(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert!(max_seen.load(Ordering::SeqCst) <= POOL_SIZE);
        assert_eq!(pool.available(), POOL_SIZE);
    }
}
