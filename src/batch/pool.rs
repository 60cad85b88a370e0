//! Fixed-capacity worker pool

use std::sync::mpsc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::BatchError;

/// Default number of loans computed concurrently
pub const DEFAULT_WORKERS: usize = 100;

/// Bounded pool of worker threads.
///
/// At most `capacity` units of work run at once; further work waits for a
/// free worker. A pool of capacity 1 runs everything sequentially, in order.
pub struct WorkerPool {
    pool: ThreadPool,
    capacity: usize,
}

impl WorkerPool {
    /// Build a pool with `capacity` workers (a capacity of 0 is raised to 1)
    pub fn new(capacity: usize) -> Result<Self, BatchError> {
        let capacity = capacity.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(capacity)
            .thread_name(|i| format!("amort-worker-{i}"))
            .build()?;
        log::debug!("Worker pool started with {} workers", capacity);
        Ok(Self { pool, capacity })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Apply `f` to every item and block until all are done.
    ///
    /// Output slot `i` always holds the result for `items[i]`, whatever order
    /// the workers finish in.
    pub fn map_ordered<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(usize, &T) -> R + Sync + Send,
    {
        let mut out = Vec::with_capacity(items.len());
        self.pool.install(|| {
            items
                .par_iter()
                .enumerate()
                .map(|(i, item)| f(i, item))
                .collect_into_vec(&mut out);
        });
        out
    }

    /// Queue one unit of work and return a channel that yields its result
    pub fn submit<R, F>(&self, job: F) -> mpsc::Receiver<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        self.pool.spawn(move || {
            // Receiver may have been dropped by a fire-and-forget caller
            let _ = tx.send(job());
        });
        rx
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("capacity", &self.capacity)
            .finish()
    }
}
