//! Score comparison policy.

use serde::{Deserialize, Serialize};

/// Whether we are maximizing or minimizing the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObjectiveDirection {
    #[default]
    Maximize,
    Minimize,
}

impl ObjectiveDirection {
    /// True when `score` strictly improves on `reference`.
    ///
    /// NaN never improves on anything and every real score improves on NaN.
    pub fn is_better(self, score: f64, reference: f64) -> bool {
        if score.is_nan() {
            return false;
        }
        if reference.is_nan() {
            return true;
        }
        match self {
            Self::Maximize => score > reference,
            Self::Minimize => score < reference,
        }
    }

    /// Index of the best score, scanning in order. Ties keep the earliest
    /// index. `None` only for an empty input.
    pub fn best_index(self, scores: &[f64]) -> Option<usize> {
        self.best_of(scores.iter().copied().enumerate())
    }

    /// Like [`ObjectiveDirection::best_index`] over `(index, score)` pairs,
    /// for callers that skip some entries.
    pub fn best_of(self, scores: impl IntoIterator<Item = (usize, f64)>) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, score) in scores {
            let improved = match best {
                None => true,
                Some((_, best_score)) => self.is_better(score, best_score),
            };
            if improved {
                best = Some((index, score));
            }
        }
        best.map(|(index, _)| index)
    }
}
