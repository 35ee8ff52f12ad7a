//! Bounded worker pool over a pre-allocated arena of result slots.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, warn};

/// How jobs are handed to workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DispatchMode {
    /// Each worker owns one contiguous range of jobs, processed in order.
    #[default]
    Static,
    /// Workers pull jobs one at a time from a shared channel.
    Queue,
}

/// A job that returned an error. The worker that ran it stops taking jobs.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFailure<E> {
    pub job: usize,
    pub worker: usize,
    pub error: E,
}

/// Outcome of one dispatch, inspected by the caller after the join.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport<E> {
    /// Number of workers actually used.
    pub workers: usize,
    /// Failed jobs, sorted by job index.
    pub failures: Vec<JobFailure<E>>,
}

impl<E> DispatchReport<E> {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// The failure with the lowest job index, independent of completion order.
    pub fn into_first_failure(self) -> Option<JobFailure<E>> {
        self.failures.into_iter().next()
    }
}

/// Resolve the worker count: `0` means every rayon thread, and there are never
/// more workers than jobs.
pub fn resolve_workers(max_workers: usize, jobs: usize) -> usize {
    let requested = if max_workers == 0 {
        rayon::current_num_threads()
    } else {
        max_workers
    };
    requested.min(jobs)
}

/// Split `0..jobs` into `workers` contiguous ranges whose lengths differ by at
/// most one, earlier ranges taking the remainder.
pub fn partition(jobs: usize, workers: usize) -> Vec<Range<usize>> {
    if jobs == 0 || workers == 0 {
        return Vec::new();
    }
    let workers = workers.min(jobs);
    let base = jobs / workers;
    let remainder = jobs % workers;

    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    for w in 0..workers {
        let len = if w < remainder { base + 1 } else { base };
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Runs independent jobs, one per slot, across a bounded number of workers.
///
/// Every job writes only its own slot, so no locking is needed. Each worker
/// builds one private state value with `init` and reuses it for all of its
/// jobs; this is where scratch buffers live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    max_workers: usize,
    mode: DispatchMode,
}

impl WorkerPool {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers,
            mode: DispatchMode::Static,
        }
    }

    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Run `job(state, job_index, slot)` for every slot and join before returning.
    pub fn run<T, S, E, I, F>(&self, slots: &mut [T], init: I, job: F) -> DispatchReport<E>
    where
        T: Send,
        E: Send,
        I: Fn(usize) -> S + Sync,
        F: Fn(&mut S, usize, &mut T) -> Result<(), E> + Sync,
    {
        let workers = resolve_workers(self.max_workers, slots.len());
        if workers == 0 {
            return DispatchReport {
                workers: 0,
                failures: Vec::new(),
            };
        }

        debug!(
            "Dispatching {} jobs across {} workers ({:?})",
            slots.len(),
            workers,
            self.mode
        );

        let mut failures = if workers == 1 {
            run_chunk(0, 0, slots, &init, &job).into_iter().collect()
        } else {
            match self.mode {
                DispatchMode::Static => run_static(workers, slots, &init, &job),
                DispatchMode::Queue => run_queue(workers, slots, &init, &job),
            }
        };
        failures.sort_by_key(|f| f.job);

        DispatchReport { workers, failures }
    }
}

/// Run jobs with `WorkerPool::new(max_workers)` in static mode.
pub fn parallelize<T, S, E, I, F>(
    max_workers: usize,
    slots: &mut [T],
    init: I,
    job: F,
) -> DispatchReport<E>
where
    T: Send,
    E: Send,
    I: Fn(usize) -> S + Sync,
    F: Fn(&mut S, usize, &mut T) -> Result<(), E> + Sync,
{
    WorkerPool::new(max_workers).run(slots, init, job)
}

fn run_chunk<T, S, E, I, F>(
    worker: usize,
    start: usize,
    chunk: &mut [T],
    init: &I,
    job: &F,
) -> Option<JobFailure<E>>
where
    I: Fn(usize) -> S,
    F: Fn(&mut S, usize, &mut T) -> Result<(), E>,
{
    let mut state = init(worker);
    for (offset, slot) in chunk.iter_mut().enumerate() {
        let index = start + offset;
        if let Err(error) = job(&mut state, index, slot) {
            let skipped = chunk.len() - offset - 1;
            warn!(
                "Job {} failed on worker {}; skipping {} remaining jobs of that worker",
                index, worker, skipped
            );
            return Some(JobFailure {
                job: index,
                worker,
                error,
            });
        }
    }
    None
}

fn run_static<T, S, E, I, F>(
    workers: usize,
    slots: &mut [T],
    init: &I,
    job: &F,
) -> Vec<JobFailure<E>>
where
    T: Send,
    E: Send,
    I: Fn(usize) -> S + Sync,
    F: Fn(&mut S, usize, &mut T) -> Result<(), E> + Sync,
{
    let ranges = partition(slots.len(), workers);
    let mut chunks = Vec::with_capacity(ranges.len());
    let mut rest = slots;
    for (worker, range) in ranges.into_iter().enumerate() {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
        chunks.push((worker, range.start, head));
        rest = tail;
    }

    chunks
        .into_par_iter()
        .filter_map(|(worker, start, chunk)| run_chunk(worker, start, chunk, init, job))
        .collect()
}

fn run_queue<T, S, E, I, F>(
    workers: usize,
    slots: &mut [T],
    init: &I,
    job: &F,
) -> Vec<JobFailure<E>>
where
    T: Send,
    E: Send,
    I: Fn(usize) -> S + Sync,
    F: Fn(&mut S, usize, &mut T) -> Result<(), E> + Sync,
{
    let (job_tx, job_rx) = crossbeam_channel::unbounded();
    for item in slots.iter_mut().enumerate() {
        // the receiver is alive until the end of this function
        let _ = job_tx.send(item);
    }
    drop(job_tx);

    let (fail_tx, fail_rx) = crossbeam_channel::unbounded();
    rayon::scope(|scope| {
        for worker in 0..workers {
            let job_rx = job_rx.clone();
            let fail_tx = fail_tx.clone();
            scope.spawn(move |_| {
                let mut state = init(worker);
                for (index, slot) in job_rx.iter() {
                    if let Err(error) = job(&mut state, index, slot) {
                        warn!("Job {} failed on worker {}; worker stops", index, worker);
                        let _ = fail_tx.send(JobFailure {
                            job: index,
                            worker,
                            error,
                        });
                        break;
                    }
                }
            });
        }
    });
    drop(fail_tx);

    fail_rx.try_iter().collect()
}
