//! K-fold cross-validation of a single estimator configuration.

use std::time::{Duration, Instant};
use tracing::debug;

use tg_parallel::WorkerPool;
use tg_types::{CvError, Estimator, FoldStage, Scorer, Split, Splitter, Table};

use crate::objective::ObjectiveDirection;

/// Outputs of one fold.
#[derive(Debug, Clone)]
pub struct FoldResult<E> {
    pub fold: usize,
    /// The clone fitted on this fold's training rows.
    pub estimator: E,
    pub test_score: f64,
    pub fit_time: Duration,
    /// Time spent predicting the test rows and scoring them.
    pub score_time: Duration,
}

/// Per-fold outputs of [`cross_validate`], indexed by fold number.
#[derive(Debug, Clone)]
pub struct CrossValidateResult<E> {
    pub folds: Vec<FoldResult<E>>,
}

impl<E> CrossValidateResult<E> {
    pub fn len(&self) -> usize {
        self.folds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folds.is_empty()
    }

    pub fn test_scores(&self) -> Vec<f64> {
        self.folds.iter().map(|f| f.test_score).collect()
    }

    /// Arithmetic mean of the fold scores; NaN when there are no folds.
    pub fn mean_score(&self) -> f64 {
        if self.folds.is_empty() {
            return f64::NAN;
        }
        self.folds.iter().map(|f| f.test_score).sum::<f64>() / self.folds.len() as f64
    }

    /// Population standard deviation of the fold scores.
    pub fn std_score(&self) -> f64 {
        if self.folds.is_empty() {
            return f64::NAN;
        }
        let mean = self.mean_score();
        let variance = self
            .folds
            .iter()
            .map(|f| (f.test_score - mean).powi(2))
            .sum::<f64>()
            / self.folds.len() as f64;
        variance.sqrt()
    }

    pub fn mean_fit_time(&self) -> Duration {
        match u32::try_from(self.folds.len()) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.folds.iter().map(|f| f.fit_time).sum::<Duration>() / n,
        }
    }

    /// The best-scoring fold; ties keep the earliest fold.
    pub fn best_fold(&self, direction: ObjectiveDirection) -> Option<&FoldResult<E>> {
        direction
            .best_index(&self.test_scores())
            .map(|i| &self.folds[i])
    }

    /// Consume the result, keeping only the best fold's fitted estimator.
    pub fn into_best_estimator(self, direction: ObjectiveDirection) -> Option<E> {
        let best = direction.best_index(&self.test_scores())?;
        self.folds.into_iter().nth(best).map(|f| f.estimator)
    }
}

/// Reusable per-worker train/test tables.
#[derive(Debug, Default)]
struct FoldBuffers {
    x_train: Table,
    y_train: Table,
    x_test: Table,
    y_test: Table,
}

impl FoldBuffers {
    fn load(&mut self, features: &Table, targets: &Table, split: &Split) {
        self.x_train.gather_rows_from(features, &split.train);
        self.y_train.gather_rows_from(targets, &split.train);
        self.x_test.gather_rows_from(features, &split.test);
        self.y_test.gather_rows_from(targets, &split.test);
    }
}

/// Cross-validate `estimator` with up to `n_jobs` concurrent fold workers
/// (`0` uses every rayon thread).
///
/// `groups` is reserved for group-aware splitters; it is only checked for
/// length.
pub fn cross_validate<E, Sc, Sp>(
    estimator: &E,
    features: &Table,
    targets: &Table,
    groups: Option<&[i64]>,
    scorer: &Sc,
    splitter: &Sp,
    n_jobs: usize,
) -> Result<CrossValidateResult<E>, CvError>
where
    E: Estimator,
    Sc: Scorer + ?Sized,
    Sp: Splitter + ?Sized,
{
    cross_validate_with(
        &WorkerPool::new(n_jobs),
        estimator,
        features,
        targets,
        groups,
        scorer,
        splitter,
    )
}

/// [`cross_validate`] on an explicitly configured worker pool.
pub fn cross_validate_with<E, Sc, Sp>(
    pool: &WorkerPool,
    estimator: &E,
    features: &Table,
    targets: &Table,
    groups: Option<&[i64]>,
    scorer: &Sc,
    splitter: &Sp,
) -> Result<CrossValidateResult<E>, CvError>
where
    E: Estimator,
    Sc: Scorer + ?Sized,
    Sp: Splitter + ?Sized,
{
    let n_samples = features.rows();
    if targets.rows() != n_samples {
        return Err(CvError::RowCountMismatch {
            features: n_samples,
            targets: targets.rows(),
        });
    }
    if let Some(groups) = groups {
        if groups.len() != n_samples {
            return Err(CvError::GroupCountMismatch {
                samples: n_samples,
                groups: groups.len(),
            });
        }
    }

    let n_splits = splitter.n_splits(features, targets);
    if n_splits == 0 {
        return Err(CvError::NoFolds);
    }

    let splits: Vec<Split> = splitter.split(features, targets).collect();
    if splits.len() != n_splits {
        return Err(CvError::SplitCountMismatch {
            expected: n_splits,
            actual: splits.len(),
        });
    }
    for (fold, split) in splits.iter().enumerate() {
        split
            .validate(n_samples)
            .map_err(|source| CvError::InvalidSplit { fold, source })?;
    }

    let mut slots: Vec<Option<FoldResult<E>>> = (0..n_splits).map(|_| None).collect();
    let report = pool.run(
        &mut slots,
        |_| FoldBuffers::default(),
        |buffers, fold, slot| {
            let split = &splits[fold];
            buffers.load(features, targets, split);

            let mut model = estimator.clone();
            let started = Instant::now();
            model
                .fit(&buffers.x_train, &buffers.y_train)
                .map_err(|source| CvError::Estimator {
                    fold,
                    stage: FoldStage::Fit,
                    source,
                })?;
            let fit_time = started.elapsed();

            let started = Instant::now();
            let predicted = model
                .transform(&buffers.x_test, &buffers.y_test)
                .map_err(|source| CvError::Estimator {
                    fold,
                    stage: FoldStage::Transform,
                    source,
                })?;
            let test_score = scorer.score(&buffers.y_test, &predicted);
            let score_time = started.elapsed();

            debug!(
                "Fold {} scored {} (train {}, test {}, fit {:?})",
                fold,
                test_score,
                split.train.len(),
                split.test.len(),
                fit_time
            );
            *slot = Some(FoldResult {
                fold,
                estimator: model,
                test_score,
                fit_time,
                score_time,
            });
            Ok(())
        },
    );

    if let Some(failure) = report.into_first_failure() {
        return Err(failure.error);
    }

    let folds: Vec<FoldResult<E>> = slots.into_iter().flatten().collect();
    debug_assert_eq!(folds.len(), n_splits);
    Ok(CrossValidateResult { folds })
}
