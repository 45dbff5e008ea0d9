//! Bounded worker pool for independent units of work.
//!
//! Each batch gets its own rayon pool sized from [`PoolConfig`]. Work items
//! share nothing mutable; the batch returns every result or the first error.

use crate::progress::ProgressSink;
use crate::{Error, Result};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Worker pool sizing
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolConfig {
    /// Worker thread count; `None` uses the number of available CPUs
    pub threads: Option<usize>,
}

impl PoolConfig {
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads: Some(threads),
        }
    }
}

/// A task group over a dedicated thread pool
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    pub fn new(config: &PoolConfig) -> Result<Self> {
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|i| format!("hk-worker-{}", i));

        if let Some(threads) = config.threads {
            if threads == 0 {
                return Err(Error::InvalidArgument(
                    "worker thread count must be at least 1".into(),
                ));
            }
            builder = builder.num_threads(threads);
        }

        let pool = builder.build().map_err(|e| Error::Pool(e.to_string()))?;
        tracing::debug!("Started worker pool with {} threads", pool.current_num_threads());
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `task` once per item and join on the whole batch
    ///
    /// Results come back in item order. If any task fails, the batch fails
    /// with one of the errors and the successful results are discarded.
    pub fn run<T, R, F>(
        &self,
        label: &str,
        items: &[T],
        progress: &dyn ProgressSink,
        task: F,
    ) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(usize, &T) -> Result<R> + Sync,
    {
        let total = items.len();
        progress.progress(label, 0, total);

        let completed = AtomicUsize::new(0);
        self.pool.install(|| {
            items
                .par_iter()
                .enumerate()
                .map(|(index, item)| {
                    let result = task(index, item);
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    progress.progress(label, done, total);
                    result
                })
                .collect::<Result<Vec<R>>>()
        })
    }
}
