//! Capabilities consumed by the search engine: estimators, splitters, scorers.

use serde::{Deserialize, Serialize};

use crate::errors::{EstimatorError, SplitError, SplitSide};
use crate::table::Table;

/// A learning algorithm that can be cloned, fitted and applied.
///
/// Clones must share no mutable state: the search fits many clones of the
/// same template concurrently on different threads.
pub trait Estimator: Clone + Send + Sync {
    /// Fit the estimator in place on the training rows.
    fn fit(&mut self, features: &Table, targets: &Table) -> Result<(), EstimatorError>;

    /// Predict targets for `features`. `targets` carries the expected output
    /// shape; implementations must not read its values.
    fn transform(&self, features: &Table, targets: &Table) -> Result<Table, EstimatorError>;
}

/// Quality of a prediction against ground truth. Higher is better unless the
/// search is configured to minimize.
pub trait Scorer: Send + Sync {
    fn score(&self, y_true: &Table, y_pred: &Table) -> f64;
}

impl<F> Scorer for F
where
    F: Fn(&Table, &Table) -> f64 + Send + Sync,
{
    fn score(&self, y_true: &Table, y_pred: &Table) -> f64 {
        self(y_true, y_pred)
    }
}

/// One train/test partition. Indices refer to rows of the original dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl Split {
    pub fn new(train: Vec<usize>, test: Vec<usize>) -> Self {
        Self { train, test }
    }

    /// Check that every index is below `n_samples` and that train and test
    /// share no row. The two sets need not cover every sample.
    pub fn validate(&self, n_samples: usize) -> Result<(), SplitError> {
        let out_of_bounds = |side, index| SplitError::OutOfBounds {
            side,
            index,
            n_samples,
        };
        let mut in_train = vec![false; n_samples];
        for &i in &self.train {
            if i >= n_samples {
                return Err(out_of_bounds(SplitSide::Train, i));
            }
            in_train[i] = true;
        }
        for &i in &self.test {
            if i >= n_samples {
                return Err(out_of_bounds(SplitSide::Test, i));
            }
            if in_train[i] {
                return Err(SplitError::Overlap { index: i });
            }
        }
        Ok(())
    }
}

/// A strategy producing train/test splits.
pub trait Splitter: Send + Sync {
    /// Number of folds [`Splitter::split`] will produce for this data.
    fn n_splits(&self, features: &Table, targets: &Table) -> usize;

    /// Lazily produce one split per fold. Calling again restarts the sequence.
    fn split<'a>(
        &'a self,
        features: &'a Table,
        targets: &'a Table,
    ) -> Box<dyn Iterator<Item = Split> + 'a>;
}
