//! Estimators and scorers shared by the unit tests.

use std::sync::OnceLock;

use tg_types::{Estimator, EstimatorError, Table};

use crate::inject::{Configurable, ParamSetters};

/// `n` samples with `x = i` and `y = slope * i`.
pub fn linear_data(n: usize, slope: f64) -> (Table, Table) {
    let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let y = x.iter().map(|v| slope * v).collect();
    (Table::column(x), Table::column(y))
}

/// 1.0 when every prediction matches the truth, 0.0 otherwise.
pub fn exact_match(y_true: &Table, y_pred: &Table) -> f64 {
    let same = y_true.dims() == y_pred.dims()
        && y_true
            .as_slice()
            .iter()
            .zip(y_pred.as_slice())
            .all(|(a, b)| (a - b).abs() <= 1e-9);
    if same {
        1.0
    } else {
        0.0
    }
}

/// Negated sum of absolute errors.
pub fn neg_abs_error(y_true: &Table, y_pred: &Table) -> f64 {
    -y_true
        .as_slice()
        .iter()
        .zip(y_pred.as_slice())
        .map(|(a, b)| (a - b).abs())
        .sum::<f64>()
}

/// Mean of the predictions, whatever the truth.
pub fn mean_prediction(_y_true: &Table, y_pred: &Table) -> f64 {
    let values = y_pred.as_slice();
    values.iter().sum::<f64>() / values.len() as f64
}

/// Least-squares line through the origin on the first feature, plus `bias`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Linear {
    pub bias: f64,
    pub skip_fit: bool,
    pub slope: Option<f64>,
    /// First-feature values of the training rows, in the order seen.
    pub seen_rows: Vec<f64>,
}

impl Estimator for Linear {
    fn fit(&mut self, features: &Table, targets: &Table) -> Result<(), EstimatorError> {
        self.seen_rows = features.iter_rows().map(|r| r[0]).collect();
        if self.skip_fit {
            return Ok(());
        }
        let (mut sxy, mut sxx) = (0.0, 0.0);
        for (x, y) in features.iter_rows().zip(targets.iter_rows()) {
            sxy += x[0] * y[0];
            sxx += x[0] * x[0];
        }
        self.slope = Some(if sxx == 0.0 { 0.0 } else { sxy / sxx });
        Ok(())
    }

    fn transform(&self, features: &Table, _targets: &Table) -> Result<Table, EstimatorError> {
        let slope = self.slope.ok_or(EstimatorError::NotFitted)?;
        Ok(Table::column(
            features.iter_rows().map(|r| slope * r[0] + self.bias).collect(),
        ))
    }
}

impl Configurable for Linear {
    fn param_setters() -> &'static ParamSetters<Self> {
        static SETTERS: OnceLock<ParamSetters<Linear>> = OnceLock::new();
        SETTERS.get_or_init(|| ParamSetters::new().float("bias", |l: &mut Linear, v: f64| l.bias = v))
    }
}

/// Predicts `score` everywhere; pair with [`mean_prediction`] to dictate the
/// cross-validated score of an assignment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstantScore {
    pub score: f64,
}

impl Estimator for ConstantScore {
    fn fit(&mut self, _features: &Table, _targets: &Table) -> Result<(), EstimatorError> {
        Ok(())
    }

    fn transform(&self, features: &Table, _targets: &Table) -> Result<Table, EstimatorError> {
        Ok(Table::column(vec![self.score; features.rows()]))
    }
}

impl Configurable for ConstantScore {
    fn param_setters() -> &'static ParamSetters<Self> {
        static SETTERS: OnceLock<ParamSetters<ConstantScore>> = OnceLock::new();
        SETTERS.get_or_init(|| {
            ParamSetters::new().float("score", |c: &mut ConstantScore, v: f64| c.score = v)
        })
    }
}

/// Fails to fit whenever a training row's first feature equals `poison`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Poisoned {
    pub poison: f64,
}

impl Estimator for Poisoned {
    fn fit(&mut self, features: &Table, _targets: &Table) -> Result<(), EstimatorError> {
        if features.iter_rows().any(|r| r[0] == self.poison) {
            return Err(EstimatorError::Numerical {
                message: format!("poisoned sample {}", self.poison),
            });
        }
        Ok(())
    }

    fn transform(&self, features: &Table, _targets: &Table) -> Result<Table, EstimatorError> {
        Ok(Table::zeros(features.rows(), 1))
    }
}

impl Configurable for Poisoned {
    fn param_setters() -> &'static ParamSetters<Self> {
        static SETTERS: OnceLock<ParamSetters<Poisoned>> = OnceLock::new();
        SETTERS.get_or_init(|| {
            ParamSetters::new().float("poison", |p: &mut Poisoned, v: f64| p.poison = v)
        })
    }
}
