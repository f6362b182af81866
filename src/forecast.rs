use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, TrackerError};
use crate::models::MonthlyTotal;

/// Fewest months needed before a linear trend is fitted.
pub const MIN_TREND_MONTHS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictionModel {
    /// Mean of the monthly totals (0.0 when there are none).
    Fallback { mean: f64, months: Vec<MonthlyTotal> },
    /// Least-squares line over a zero-based month index.
    Trend {
        slope: f64,
        intercept: f64,
        last_index: usize,
        months: Vec<MonthlyTotal>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Basis {
    Fallback,
    Trend,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub basis: Basis,
    pub value: f64,
    /// `YYYY-MM` of the predicted month, when any history exists.
    pub next_month: Option<String>,
    pub history: Vec<MonthlyTotal>,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Ordinary least squares of `ys` against `0..ys.len()`. Needs two or more points.
fn fit_line(ys: &[f64]) -> (f64, f64) {
    let n = ys.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = mean(ys);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    let slope = sxy / sxx;
    (slope, y_mean - slope * x_mean)
}

/// The month after a `YYYY-MM` label.
pub fn next_month_label(label: &str) -> Option<String> {
    let first = NaiveDate::parse_from_str(&format!("{label}-01"), "%Y-%m-%d").ok()?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(next.format("%Y-%m").to_string())
}

impl PredictionModel {
    pub fn fit(months: &[MonthlyTotal]) -> Result<Self> {
        let totals: Vec<f64> = months.iter().map(|m| m.total).collect();
        if let Some(m) = months.iter().find(|m| !m.total.is_finite()) {
            return Err(TrackerError::InvalidInput(format!(
                "monthly total for {} is out of range",
                m.month
            )));
        }
        let model = if months.len() < MIN_TREND_MONTHS {
            warn!(
                months = months.len(),
                "not enough monthly points to fit a trend (need >= {MIN_TREND_MONTHS}), using the mean"
            );
            PredictionModel::Fallback {
                mean: mean(&totals),
                months: months.to_vec(),
            }
        } else {
            let (slope, intercept) = fit_line(&totals);
            PredictionModel::Trend {
                slope,
                intercept,
                last_index: months.len() - 1,
                months: months.to_vec(),
            }
        };
        if !model.predict_next().is_finite() {
            return Err(TrackerError::InvalidInput(
                "monthly totals are too large to forecast".to_string(),
            ));
        }
        Ok(model)
    }

    pub fn months(&self) -> &[MonthlyTotal] {
        match self {
            PredictionModel::Fallback { months, .. } | PredictionModel::Trend { months, .. } => months,
        }
    }

    pub fn predict_next(&self) -> f64 {
        match self {
            PredictionModel::Fallback { mean, .. } => *mean,
            PredictionModel::Trend {
                slope,
                intercept,
                last_index,
                ..
            } => slope * (*last_index + 1) as f64 + intercept,
        }
    }

    pub fn forecast(&self) -> Forecast {
        let basis = match self {
            PredictionModel::Fallback { .. } => Basis::Fallback,
            PredictionModel::Trend { .. } => Basis::Trend,
        };
        let history = self.months().to_vec();
        Forecast {
            basis,
            value: self.predict_next(),
            next_month: history.last().and_then(|m| next_month_label(&m.month)),
            history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(&str, f64)]) -> Vec<MonthlyTotal> {
        points
            .iter()
            .map(|(m, t)| MonthlyTotal {
                month: m.to_string(),
                total: *t,
            })
            .collect()
    }

    #[test]
    fn test_empty_series_falls_back_to_zero() {
        let model = PredictionModel::fit(&[]).unwrap();
        assert!(matches!(model, PredictionModel::Fallback { mean, .. } if mean == 0.0));
        let forecast = model.forecast();
        assert_eq!(forecast.basis, Basis::Fallback);
        assert_eq!(forecast.value, 0.0);
        assert_eq!(forecast.next_month, None);
    }

    #[test]
    fn test_two_months_fall_back_to_mean() {
        let model =
            PredictionModel::fit(&series(&[("2025-01", 100.0), ("2025-02", 300.0)])).unwrap();
        assert!(matches!(model, PredictionModel::Fallback { mean, .. } if mean == 200.0));
        let forecast = model.forecast();
        assert_eq!(forecast.value, 200.0);
        assert_eq!(forecast.next_month.as_deref(), Some("2025-03"));
    }

    #[test]
    fn test_trend_extrapolates_one_step() {
        let model = PredictionModel::fit(&series(&[
            ("2025-01", 100.0),
            ("2025-02", 200.0),
            ("2025-03", 300.0),
        ])).unwrap();
        match &model {
            PredictionModel::Trend {
                slope,
                intercept,
                last_index,
                ..
            } => {
                assert!((slope - 100.0).abs() < 1e-9);
                assert!((intercept - 100.0).abs() < 1e-9);
                assert_eq!(*last_index, 2);
            }
            other => panic!("expected trend, got {other:?}"),
        }
        let forecast = model.forecast();
        assert_eq!(forecast.basis, Basis::Trend);
        assert!((forecast.value - 400.0).abs() < 1e-9);
        assert_eq!(forecast.next_month.as_deref(), Some("2025-04"));
        assert_eq!(forecast.history.len(), 3);
    }

    #[test]
    fn test_flat_series_predicts_flat() {
        let model = PredictionModel::fit(&series(&[
            ("2025-01", 50.0),
            ("2025-02", 50.0),
            ("2025-03", 50.0),
            ("2025-04", 50.0),
        ])).unwrap();
        let value = model.predict_next();
        assert!(value.is_finite());
        assert!((value - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_infinite_total_is_rejected() {
        let err = PredictionModel::fit(&series(&[("2025-01", f64::INFINITY), ("2025-02", 10.0)]))
            .unwrap_err();
        assert!(matches!(err, TrackerError::InvalidInput(_)));
    }

    #[test]
    fn test_overflowing_trend_is_rejected() {
        let result = PredictionModel::fit(&series(&[
            ("2025-01", -1e308),
            ("2025-02", 1e308),
            ("2025-03", 1e308),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_next_month_crosses_year() {
        assert_eq!(next_month_label("2024-12").as_deref(), Some("2025-01"));
        assert_eq!(next_month_label("2025-06").as_deref(), Some("2025-07"));
        assert_eq!(next_month_label("garbage"), None);
    }

    #[test]
    fn test_artifact_is_tagged() {
        let model = PredictionModel::fit(&series(&[("2025-01", 10.0)])).unwrap();
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["kind"], "fallback");
        let back: PredictionModel = serde_json::from_value(json).unwrap();
        assert_eq!(back, model);
    }
}
