use rayon::prelude::*;

use crate::error::{Error, Result};

/// A bounded pool of worker threads, created once and reused for every run
/// file of a batch.
///
/// [`map_ordered`](Self::map_ordered) pairs each result with its input by
/// position, so completion order on the workers never matters.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// Pool sized to the machine's available parallelism.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the threads cannot be
    /// spawned.
    pub fn new() -> Result<Self> {
        Self::build(rayon::ThreadPoolBuilder::new())
    }

    /// Pool with exactly `threads` workers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `threads` is zero or the
    /// threads cannot be spawned.
    pub fn with_threads(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(Error::config("worker pool needs at least one thread"));
        }
        Self::build(rayon::ThreadPoolBuilder::new().num_threads(threads))
    }

    fn build(builder: rayon::ThreadPoolBuilder) -> Result<Self> {
        let pool = builder
            .thread_name(|i| format!("hv-worker-{i}"))
            .build()
            .map_err(|e| Error::config(format!("cannot start worker pool: {e}")))?;
        trace_debug!(threads = pool.current_num_threads(), "worker pool started");
        Ok(Self { pool })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Apply `f` to every item on the pool and return the results in input
    /// order. The first error fails the whole map.
    ///
    /// # Errors
    ///
    /// Returns the error of a failing task.
    pub fn map_ordered<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R> + Sync + Send,
    {
        self.pool.install(|| items.par_iter().map(f).collect())
    }
}

impl core::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads())
            .finish()
    }
}
