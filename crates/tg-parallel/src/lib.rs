//! # tg-parallel
//!
//! Worker-pool dispatch for tunegrid.
//!
//! Jobs are identified by their index into a caller-owned slice of result
//! slots. The slice is split so that every worker holds exclusive `&mut`
//! access to the slots of its own jobs, which makes concurrent writes safe
//! without locks. Failures come back as a [`DispatchReport`] after the join.

mod pool;

pub use pool::{
    parallelize, partition, resolve_workers, DispatchMode, DispatchReport, JobFailure,
    WorkerPool,
};
