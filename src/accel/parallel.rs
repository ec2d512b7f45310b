//! Fixed-size CPU worker pool and the data-parallel add built on it.
//!
//! The degree of parallelism is a configured number, not the host core
//! count. The index space is cut into at most `workers` contiguous chunks;
//! each chunk is handed to exactly one task and the call returns only after
//! every task has finished.

use std::ops::Range;

use rayon::prelude::*;
use tracing::debug;

use crate::accel::{check_lengths, cpu, AddTiming, BenchError, Strategy, VectorAdder};
use crate::timer::timed;

pub const DEFAULT_WORKERS: usize = 8;

/// Elements per chunk when `len` items are split over `workers`.
pub fn chunk_len(len: usize, workers: usize) -> usize {
    len.div_ceil(workers.max(1)).max(1)
}

/// Contiguous, non-overlapping chunks covering `0..len`.
pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
    let chunk = chunk_len(len, workers);
    (0..len)
        .step_by(chunk)
        .map(|start| start..(start + chunk).min(len))
        .collect()
}

/// Dedicated rayon pool, separate from the global one.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self, BenchError> {
        if workers == 0 {
            return Err(BenchError::Config(
                "worker pool needs at least one thread".to_string(),
            ));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("vecadd-worker-{i}"))
            .build()
            .map_err(|e| BenchError::Config(format!("failed to build worker pool: {e}")))?;

        debug!(workers, "worker pool started");
        Ok(Self { pool, workers })
    }

    /// Fork-join over `data`: `f` receives each chunk together with the
    /// index range from [`partition`] that it covers.
    pub fn for_each_chunk<T, F>(&self, data: &mut [T], f: F)
    where
        T: Send,
        F: Fn(Range<usize>, &mut [T]) + Send + Sync,
    {
        if data.is_empty() {
            return;
        }

        let ranges = partition(data.len(), self.workers);
        let chunk = chunk_len(data.len(), self.workers);
        self.pool.install(|| {
            data.par_chunks_mut(chunk)
                .zip(ranges)
                .for_each(|(part, range)| f(range, part));
        });
    }
}

/// CPU data-parallel add. Times fork through join.
pub struct ParallelAdder {
    pool: WorkerPool,
}

impl ParallelAdder {
    pub fn new(workers: usize) -> Result<Self, BenchError> {
        Ok(Self {
            pool: WorkerPool::new(workers)?,
        })
    }
}

impl VectorAdder for ParallelAdder {
    fn strategy(&self) -> Strategy {
        Strategy::Parallel
    }

    fn add(&mut self, a: &[f32], b: &[f32], out: &mut [f32]) -> Result<AddTiming, BenchError> {
        check_lengths(a, b, out)?;
        let ((), interval) = timed(|| {
            self.pool.for_each_chunk(out, |range, part| {
                cpu::add_into(&a[range.clone()], &b[range], part);
            });
        });
        Ok(AddTiming::host(interval.elapsed()))
    }
}
