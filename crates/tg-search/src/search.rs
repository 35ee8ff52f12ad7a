//! Grid search driver: every assignment cross-validated, best one selected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tg_parallel::WorkerPool;
use tg_types::{
    format_assignment, CvError, Estimator, EstimatorError, ParamAssignment, ParamGrid,
    ParamValue, Scorer, SearchError, SearchResult, Splitter, Table,
};

use crate::config::{ErrorPolicy, SearchConfig};
use crate::grid::parameter_grid;
use crate::inject::{set_params, Configurable};
use crate::kfold::KFold;
use crate::objective::ObjectiveDirection;
use crate::validation::cross_validate_with;

/// Exhaustive search over a [`ParamGrid`], scoring each assignment by
/// cross-validation.
pub struct GridSearchCv<E> {
    estimator: E,
    param_grid: ParamGrid,
    scorer: Arc<dyn Scorer>,
    splitter: Arc<dyn Splitter>,
    config: SearchConfig,
}

impl<E: Estimator + Configurable> GridSearchCv<E> {
    /// Search with three unshuffled folds and the default configuration.
    pub fn new(estimator: E, param_grid: ParamGrid, scorer: impl Scorer + 'static) -> Self {
        Self {
            estimator,
            param_grid,
            scorer: Arc::new(scorer),
            splitter: Arc::new(KFold::default()),
            config: SearchConfig::default(),
        }
    }

    pub fn with_splitter(mut self, splitter: impl Splitter + 'static) -> Self {
        self.splitter = Arc::new(splitter);
        self
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn param_grid(&self) -> &ParamGrid {
        &self.param_grid
    }

    /// Evaluate every assignment and pick the best.
    ///
    /// Assignments run concurrently, but results are ranked in enumeration
    /// order, so the chosen assignment does not depend on `n_jobs`.
    pub fn fit(&self, features: &Table, targets: &Table) -> SearchResult<GridSearchResult<E>> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let assignments = parameter_grid(&self.param_grid)?;
        let direction = self.config.direction;

        info!(
            "Grid search {} starting: {} assignments, {} folds each, n_jobs={}, cv_jobs={}",
            run_id,
            assignments.len(),
            self.splitter.n_splits(features, targets),
            self.config.n_jobs,
            self.config.cv_jobs
        );

        let pool = WorkerPool::new(self.config.n_jobs).with_mode(self.config.dispatch);
        let cv_pool = WorkerPool::new(self.config.cv_jobs).with_mode(self.config.dispatch);

        let mut slots: Vec<Option<AssignmentOutcome<E>>> =
            (0..assignments.len()).map(|_| None).collect();
        let report = pool.run(
            &mut slots,
            |_| (),
            |_, index, slot| {
                let params = &assignments[index];
                match self.evaluate(index, params, features, targets, &cv_pool) {
                    Ok(evaluated) => {
                        debug!(
                            "Grid search {}: assignment {} {} scored {}",
                            run_id,
                            index,
                            format_assignment(params),
                            evaluated.mean_score
                        );
                        *slot = Some(AssignmentOutcome::Evaluated(evaluated));
                        Ok(())
                    }
                    // A bad assignment only fails itself; fit failures follow the policy.
                    Err(error)
                        if self.config.error_policy == ErrorPolicy::Abort
                            && !matches!(error, SearchError::Configuration { .. }) =>
                    {
                        Err(error)
                    }
                    Err(error) => {
                        warn!("Grid search {}: {}", run_id, error);
                        *slot = Some(AssignmentOutcome::Failed {
                            params: params.clone(),
                            error,
                        });
                        Ok(())
                    }
                }
            },
        );

        if let Some(failure) = report.into_first_failure() {
            warn!("Grid search {} aborted: {}", run_id, failure.error);
            return Err(failure.error);
        }

        let outcomes: Vec<AssignmentOutcome<E>> = slots.into_iter().flatten().collect();
        let names: Vec<&str> = self.param_grid.names().collect();
        let cv_results = ResultsTable::build(&names, &outcomes);

        // Rank in enumeration order, never completion order.
        let best_index = direction.best_of(
            outcomes
                .iter()
                .enumerate()
                .filter_map(|(i, o)| o.evaluated().map(|e| (i, e.mean_score))),
        );

        let result = GridSearchResult {
            run_id,
            started_at,
            finished_at: Utc::now(),
            direction,
            cv_results,
            outcomes,
            best_index,
        };

        match (result.best_index, result.best_score()) {
            (Some(index), Some(score)) => info!(
                "Grid search {} finished: best assignment {} {} with score {}",
                run_id,
                index,
                result.best_params().map(format_assignment).unwrap_or_default(),
                score
            ),
            _ => info!("Grid search {} finished without a successful assignment", run_id),
        }

        Ok(result)
    }

    fn evaluate(
        &self,
        index: usize,
        params: &ParamAssignment,
        features: &Table,
        targets: &Table,
        cv_pool: &WorkerPool,
    ) -> SearchResult<EvaluatedAssignment<E>> {
        let mut estimator = self.estimator.clone();
        set_params(&mut estimator, params).map_err(|source| SearchError::Configuration {
            assignment: index,
            params: format_assignment(params),
            source,
        })?;

        let cv_failure = |source: CvError| SearchError::CrossValidation {
            assignment: index,
            params: format_assignment(params),
            source,
        };
        let cv = cross_validate_with(
            cv_pool,
            &estimator,
            features,
            targets,
            None,
            self.scorer.as_ref(),
            self.splitter.as_ref(),
        )
        .map_err(cv_failure)?;

        let fold_scores = cv.test_scores();
        let mean_score = cv.mean_score();
        let std_score = cv.std_score();
        let mean_fit_time = cv.mean_fit_time().as_secs_f64();
        let estimator = cv
            .into_best_estimator(self.config.direction)
            .ok_or_else(|| cv_failure(CvError::NoFolds))?;

        Ok(EvaluatedAssignment {
            params: params.clone(),
            mean_score,
            std_score,
            mean_fit_time,
            fold_scores,
            estimator,
        })
    }
}

/// A successfully cross-validated assignment.
#[derive(Debug, Clone)]
pub struct EvaluatedAssignment<E> {
    pub params: ParamAssignment,
    pub mean_score: f64,
    pub std_score: f64,
    /// Mean fit time per fold, in seconds.
    pub mean_fit_time: f64,
    pub fold_scores: Vec<f64>,
    /// The fitted estimator of this assignment's best fold.
    pub estimator: E,
}

/// What happened to one assignment.
#[derive(Debug)]
pub enum AssignmentOutcome<E> {
    Evaluated(EvaluatedAssignment<E>),
    Failed {
        params: ParamAssignment,
        error: SearchError,
    },
}

impl<E> AssignmentOutcome<E> {
    pub fn params(&self) -> &ParamAssignment {
        match self {
            Self::Evaluated(e) => &e.params,
            Self::Failed { params, .. } => params,
        }
    }

    pub fn evaluated(&self) -> Option<&EvaluatedAssignment<E>> {
        match self {
            Self::Evaluated(e) => Some(e),
            Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&SearchError> {
        match self {
            Self::Evaluated(_) => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}

/// Column-oriented view of a run: one column per parameter plus score
/// columns, one row per assignment in enumeration order. Failed assignments
/// have `None` scores.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultsTable {
    pub params: BTreeMap<String, Vec<ParamValue>>,
    /// Mean cross-validated score.
    pub score: Vec<Option<f64>>,
    pub std_score: Vec<Option<f64>>,
    /// Mean fit time per fold, in seconds.
    pub mean_fit_time: Vec<Option<f64>>,
}

impl ResultsTable {
    fn build<E>(names: &[&str], outcomes: &[AssignmentOutcome<E>]) -> Self {
        let mut params: BTreeMap<String, Vec<ParamValue>> = names
            .iter()
            .map(|name| (name.to_string(), Vec::with_capacity(outcomes.len())))
            .collect();
        let mut table = Self {
            params: BTreeMap::new(),
            score: Vec::with_capacity(outcomes.len()),
            std_score: Vec::with_capacity(outcomes.len()),
            mean_fit_time: Vec::with_capacity(outcomes.len()),
        };

        for outcome in outcomes {
            for (name, column) in params.iter_mut() {
                if let Some(value) = outcome.params().get(name) {
                    column.push(value.clone());
                }
            }
            let evaluated = outcome.evaluated();
            table.score.push(evaluated.map(|e| e.mean_score));
            table.std_score.push(evaluated.map(|e| e.std_score));
            table.mean_fit_time.push(evaluated.map(|e| e.mean_fit_time));
        }

        table.params = params;
        table
    }

    pub fn len(&self) -> usize {
        self.score.len()
    }

    pub fn is_empty(&self) -> bool {
        self.score.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[ParamValue]> {
        self.params.get(name).map(Vec::as_slice)
    }

    pub fn scores(&self) -> &[Option<f64>] {
        &self.score
    }
}

/// Everything a completed run produced. Read-only once returned.
#[derive(Debug)]
pub struct GridSearchResult<E> {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub direction: ObjectiveDirection,
    pub cv_results: ResultsTable,
    outcomes: Vec<AssignmentOutcome<E>>,
    best_index: Option<usize>,
}

impl<E: Estimator> GridSearchResult<E> {
    /// Outcomes in enumeration order.
    pub fn outcomes(&self) -> &[AssignmentOutcome<E>] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Index of the winning assignment; `None` when nothing succeeded.
    pub fn best_index(&self) -> Option<usize> {
        self.best_index
    }

    fn best(&self) -> Option<&EvaluatedAssignment<E>> {
        self.best_index
            .and_then(|i| self.outcomes.get(i))
            .and_then(AssignmentOutcome::evaluated)
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best().map(|b| b.mean_score)
    }

    pub fn best_params(&self) -> Option<&ParamAssignment> {
        self.best().map(|b| &b.params)
    }

    /// Best-fold fitted estimator of the winning assignment.
    pub fn best_estimator(&self) -> Option<&E> {
        self.best().map(|b| &b.estimator)
    }

    /// Failed assignments in enumeration order: configuration errors always,
    /// cross-validation failures under [`ErrorPolicy::Record`].
    pub fn failures(&self) -> impl Iterator<Item = &SearchError> {
        self.outcomes.iter().filter_map(AssignmentOutcome::error)
    }

    /// Predict with the best estimator.
    pub fn transform(&self, features: &Table, targets: &Table) -> Result<Table, EstimatorError> {
        self.best_estimator()
            .ok_or(EstimatorError::NotFitted)?
            .transform(features, targets)
    }
}
