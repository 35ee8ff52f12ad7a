//! # tg-search
//!
//! Exhaustive hyperparameter search for tunegrid.
//!
//! Expands a [`ParamGrid`](tg_types::ParamGrid) into its cartesian product,
//! injects each assignment into a clone of a template estimator through its
//! registered setters, cross-validates every clone concurrently and selects
//! the best assignment in enumeration order.

mod config;
mod grid;
mod inject;
mod kfold;
mod objective;
mod search;
mod validation;

#[cfg(test)]
mod testing;

pub use config::{ErrorPolicy, SearchConfig};
pub use grid::parameter_grid;
pub use inject::{set_params, Configurable, ParamSetters};
pub use kfold::KFold;
pub use objective::ObjectiveDirection;
pub use search::{
    AssignmentOutcome, EvaluatedAssignment, GridSearchCv, GridSearchResult, ResultsTable,
};
pub use validation::{cross_validate, cross_validate_with, CrossValidateResult, FoldResult};

pub use tg_parallel::{DispatchMode, WorkerPool};
pub use tg_types;
