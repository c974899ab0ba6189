use std::sync::Arc;

use anyhow::{bail, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use serde::{Deserialize, Serialize};

use super::numeric::dense_columns;
use super::Model;
use crate::data::Table;

// ---------------------------------------------------------------------------
// Persisted model description
// ---------------------------------------------------------------------------

/// Predictive model as stored in `model.json`.
///
/// Both kinds score `intercept + Σ coefficients[i] · column[i]` over the
/// columns of the transformed table, positionally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    /// Regression: the score itself (float output).
    Linear {
        coefficients: Vec<f64>,
        #[serde(default)]
        intercept: f64,
    },
    /// Binary classification: `labels[1]` when `sigmoid(score) >= threshold`,
    /// else `labels[0]` (integer output).
    Logistic {
        coefficients: Vec<f64>,
        #[serde(default)]
        intercept: f64,
        #[serde(default = "default_threshold")]
        threshold: f64,
        #[serde(default = "default_labels")]
        labels: [i64; 2],
    },
}

fn default_threshold() -> f64 {
    0.5
}

fn default_labels() -> [i64; 2] {
    [0, 1]
}

impl ModelSpec {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ModelSpec::Linear { .. } => "linear",
            ModelSpec::Logistic { .. } => "logistic",
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let (coefficients, intercept) = match self {
            ModelSpec::Linear {
                coefficients,
                intercept,
            }
            | ModelSpec::Logistic {
                coefficients,
                intercept,
                ..
            } => (coefficients, intercept),
        };
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err("coefficients and intercept must be finite".into());
        }
        if let ModelSpec::Logistic { threshold, .. } = self {
            if !(*threshold > 0.0 && *threshold < 1.0) {
                return Err(format!("threshold {threshold} must lie strictly between 0 and 1"));
            }
        }
        Ok(())
    }
}

/// `intercept + Σ coef · column` for every row.
fn linear_scores(coefficients: &[f64], intercept: f64, table: &Table) -> Result<Vec<f64>> {
    if table.num_columns() != coefficients.len() {
        bail!(
            "model expects {} feature(s), got {}",
            coefficients.len(),
            table.num_columns()
        );
    }

    let mut scores = vec![intercept; table.num_rows()];
    for (coef, column) in coefficients.iter().zip(dense_columns(table)?) {
        for (score, x) in scores.iter_mut().zip(column.values().iter()) {
            *score += coef * x;
        }
    }
    if let Some(row) = scores.iter().position(|s| !s.is_finite()) {
        bail!("score for row {row} is not finite ({})", scores[row]);
    }
    Ok(scores)
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Model for ModelSpec {
    fn predict(&self, table: &Table) -> Result<ArrayRef> {
        match self {
            ModelSpec::Linear {
                coefficients,
                intercept,
            } => {
                let scores = linear_scores(coefficients, *intercept, table)?;
                Ok(Arc::new(Float64Array::from(scores)))
            }
            ModelSpec::Logistic {
                coefficients,
                intercept,
                threshold,
                labels,
            } => {
                let scores = linear_scores(coefficients, *intercept, table)?;
                let classes: Vec<i64> = scores
                    .into_iter()
                    .map(|s| if sigmoid(s) >= *threshold { labels[1] } else { labels[0] })
                    .collect();
                Ok(Arc::new(Int64Array::from(classes)))
            }
        }
    }
}
