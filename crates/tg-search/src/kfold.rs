//! K-fold splitter.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use tg_types::{Split, Splitter, Table};

/// Splits samples into `k` consecutive folds; each fold is the test set once.
///
/// The first `n_samples % k` folds get one extra sample. With shuffling and no
/// seed every call to [`Splitter::split`] draws a new permutation; set a seed
/// when the same folds must be reused across calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KFold {
    n_splits: usize,
    shuffle: bool,
    seed: Option<u64>,
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: false,
            seed: None,
        }
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Seed the shuffle. Has no effect unless shuffling is enabled.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Folds actually produced for `n_samples`: never more than the samples
    /// and never fewer than one.
    pub fn effective_splits(&self, n_samples: usize) -> usize {
        self.n_splits.min(n_samples).max(1)
    }

    fn permutation(&self, n_samples: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            match self.seed {
                Some(seed) => indices.shuffle(&mut StdRng::seed_from_u64(seed)),
                None => indices.shuffle(&mut rand::rng()),
            }
        }
        indices
    }
}

impl Default for KFold {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Splitter for KFold {
    fn n_splits(&self, features: &Table, _targets: &Table) -> usize {
        self.effective_splits(features.rows())
    }

    fn split<'a>(
        &'a self,
        features: &'a Table,
        _targets: &'a Table,
    ) -> Box<dyn Iterator<Item = Split> + 'a> {
        let n_samples = features.rows();
        let k = self.effective_splits(n_samples);
        let indices = self.permutation(n_samples);
        let base = n_samples / k;
        let remainder = n_samples % k;

        let mut start = 0;
        Box::new((0..k).map(move |fold| {
            let len = if fold < remainder { base + 1 } else { base };
            let end = start + len;
            let test = indices[start..end].to_vec();
            let train = indices[..start]
                .iter()
                .chain(&indices[end..])
                .copied()
                .collect();
            start = end;
            Split { train, test }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(n: usize) -> (Table, Table) {
        let x = Table::column((0..n).map(|i| i as f64).collect());
        let y = x.clone();
        (x, y)
    }

    #[test]
    fn test_folds_partition_the_samples() {
        let (x, y) = data(10);
        let kfold = KFold::new(3);
        assert_eq!(kfold.n_splits(&x, &y), 3);

        let splits: Vec<Split> = kfold.split(&x, &y).collect();
        assert_eq!(splits.len(), 3);
        assert_eq!(splits[0].test, vec![0, 1, 2, 3]);
        assert_eq!(splits[1].test, vec![4, 5, 6]);
        assert_eq!(splits[2].test, vec![7, 8, 9]);

        let mut all_test: Vec<usize> = splits.iter().flat_map(|s| s.test.clone()).collect();
        all_test.sort_unstable();
        assert_eq!(all_test, (0..10).collect::<Vec<_>>());

        for split in &splits {
            assert!(split.validate(10).is_ok());
            assert_eq!(split.train.len() + split.test.len(), 10);
        }
    }

    #[test]
    fn clamps_to_sample_count() {
        let (x, y) = data(2);
        let kfold = KFold::new(5);
        assert_eq!(kfold.n_splits(&x, &y), 2);
        assert_eq!(kfold.split(&x, &y).count(), 2);
    }

    #[test]
    fn single_split_tests_everything() {
        let (x, y) = data(4);
        let splits: Vec<Split> = KFold::new(1).split(&x, &y).collect();
        assert_eq!(splits, vec![Split::new(vec![], vec![0, 1, 2, 3])]);
    }

    #[test]
    fn seeded_shuffle_is_restartable() {
        let (x, y) = data(20);
        let kfold = KFold::new(4).with_shuffle(true).with_seed(42);
        let first: Vec<Split> = kfold.split(&x, &y).collect();
        let second: Vec<Split> = kfold.split(&x, &y).collect();
        assert_eq!(first, second);

        let unshuffled: Vec<Split> = KFold::new(4).split(&x, &y).collect();
        assert_ne!(first, unshuffled);
    }

    #[test]
    fn default_is_three_unshuffled_folds() {
        assert_eq!(KFold::default(), KFold::new(3));
    }
}
