use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tg_search::{
    Configurable, GridSearchCv, KFold, ObjectiveDirection, ParamSetters, SearchConfig,
};
use tg_types::{format_assignment, Estimator, EstimatorError, ParamGrid, Table};

/// One-feature ridge regression.
#[derive(Debug, Clone, Default)]
struct Ridge {
    alpha: f64,
    fit_intercept: bool,
    coef: f64,
    intercept: f64,
}

impl Estimator for Ridge {
    fn fit(&mut self, features: &Table, targets: &Table) -> Result<(), EstimatorError> {
        let n = features.rows() as f64;
        if n == 0.0 {
            return Err(EstimatorError::InvalidInput {
                message: "no training rows".to_string(),
            });
        }
        let (x_mean, y_mean) = if self.fit_intercept {
            (
                features.iter_rows().map(|r| r[0]).sum::<f64>() / n,
                targets.iter_rows().map(|r| r[0]).sum::<f64>() / n,
            )
        } else {
            (0.0, 0.0)
        };
        let (mut sxy, mut sxx) = (0.0, 0.0);
        for (x, y) in features.iter_rows().zip(targets.iter_rows()) {
            sxy += (x[0] - x_mean) * (y[0] - y_mean);
            sxx += (x[0] - x_mean) * (x[0] - x_mean);
        }
        self.coef = sxy / (sxx + self.alpha);
        self.intercept = y_mean - self.coef * x_mean;
        Ok(())
    }

    fn transform(&self, features: &Table, _targets: &Table) -> Result<Table, EstimatorError> {
        Ok(Table::column(
            features
                .iter_rows()
                .map(|r| self.coef * r[0] + self.intercept)
                .collect(),
        ))
    }
}

impl Configurable for Ridge {
    fn param_setters() -> &'static ParamSetters<Self> {
        static SETTERS: OnceLock<ParamSetters<Ridge>> = OnceLock::new();
        SETTERS.get_or_init(|| {
            ParamSetters::new()
                .float("alpha", |r: &mut Ridge, v: f64| r.alpha = v)
                .text("intercept", |r: &mut Ridge, v: String| {
                    r.fit_intercept = v == "fit"
                })
        })
    }
}

fn mean_squared_error(y_true: &Table, y_pred: &Table) -> f64 {
    let n = y_true.rows().max(1) as f64;
    y_true
        .as_slice()
        .iter()
        .zip(y_pred.as_slice())
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
        / n
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tg_search=info".into()),
        )
        .init();

    // y = 3x + 5 with uniform noise
    let mut rng = StdRng::seed_from_u64(42);
    let x: Vec<f64> = (0..200).map(|i| i as f64 / 10.0).collect();
    let y = x
        .iter()
        .map(|v| 3.0 * v + 5.0 + rng.random_range(-1.0..1.0))
        .collect();
    let (features, targets) = (Table::column(x), Table::column(y));

    let grid = ParamGrid::new()
        .add("alpha", [0.0, 0.1, 1.0, 10.0, 100.0])
        .add("intercept", ["fit", "none"]);

    let config = SearchConfig::default().with_direction(ObjectiveDirection::Minimize);
    let search = GridSearchCv::new(Ridge::default(), grid, mean_squared_error)
        .with_splitter(KFold::new(5).with_shuffle(true).with_seed(7))
        .with_config(config);

    let result = search.fit(&features, &targets)?;

    println!("Run {} evaluated {} assignments", result.run_id, result.len());
    for outcome in result.outcomes() {
        if let Some(evaluated) = outcome.evaluated() {
            println!(
                "  {:<36} mse {:>10.4} ± {:.4}",
                format_assignment(&evaluated.params),
                evaluated.mean_score,
                evaluated.std_score
            );
        }
    }

    if let (Some(params), Some(score)) = (result.best_params(), result.best_score()) {
        println!("Best: {} (mse {:.4})", format_assignment(params), score);
    }
    if let Some(best) = result.best_estimator() {
        println!("Fitted: y = {:.3}x + {:.3}", best.coef, best.intercept);
    }

    println!("{}", serde_json::to_string_pretty(&result.cv_results)?);
    Ok(())
}
