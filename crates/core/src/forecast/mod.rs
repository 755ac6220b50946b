//! Forecast adapter around the pluggable forecasting engine.
//!
//! The engine produces raw dated values; the adapter screens the input
//! history, maps engine failures into per-article `ForecastStatus::Failed`
//! (never aborting the batch), clips negatives and truncates toward zero.

pub mod trend;

use crate::domain::article::ArticleSeries;
use crate::domain::forecast::{ForecastPoint, ForecastResult};
use chrono::NaiveDate;

pub const DEFAULT_HORIZON: usize = 6;
pub const MIN_HISTORY_POINTS: usize = 2;

pub trait ForecastingEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Predict one value per future period. Values may be fractional or
    /// negative; the adapter owns rounding and clipping.
    fn forecast(
        &self,
        series: &ArticleSeries,
        horizon: usize,
    ) -> anyhow::Result<Vec<(NaiveDate, f64)>>;
}

#[derive(Debug, Clone)]
pub struct ForecastAdapter {
    pub horizon: usize,
}

impl ForecastAdapter {
    pub fn new(horizon: usize) -> Self {
        Self { horizon }
    }

    pub fn run(&self, engine: &dyn ForecastingEngine, series: &ArticleSeries) -> ForecastResult {
        if series.distinct_dates() < MIN_HISTORY_POINTS {
            return ForecastResult::failed(
                series.article.clone(),
                format!(
                    "insufficient history: {} distinct dates, need {}",
                    series.distinct_dates(),
                    MIN_HISTORY_POINTS
                ),
            );
        }

        let raw = match engine.forecast(series, self.horizon) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(
                    article = %series.article,
                    engine = engine.name(),
                    error = %format!("{err:#}"),
                    "forecast failed; article continues without forecast"
                );
                return ForecastResult::failed(series.article.clone(), format!("{err:#}"));
            }
        };

        if raw.len() != self.horizon {
            return ForecastResult::failed(
                series.article.clone(),
                format!(
                    "engine {} returned {} periods, expected {}",
                    engine.name(),
                    raw.len(),
                    self.horizon
                ),
            );
        }

        let points = raw
            .into_iter()
            .map(|(date, value)| ForecastPoint {
                date,
                // Sales volumes cannot be negative; fractional predictions
                // truncate toward zero.
                quantity: value.max(0.0).trunc() as u32,
            })
            .collect();

        ForecastResult::ok(series.article.clone(), points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::article::SeriesPoint;
    use chrono::Duration;

    struct FixedEngine(Vec<f64>);

    impl ForecastingEngine for FixedEngine {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn forecast(
            &self,
            series: &ArticleSeries,
            _horizon: usize,
        ) -> anyhow::Result<Vec<(NaiveDate, f64)>> {
            let last = series.last_date().unwrap();
            Ok(self
                .0
                .iter()
                .enumerate()
                .map(|(i, &v)| (last + Duration::days(7 * (i as i64 + 1)), v))
                .collect())
        }
    }

    struct FailingEngine;

    impl ForecastingEngine for FailingEngine {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn forecast(
            &self,
            _series: &ArticleSeries,
            _horizon: usize,
        ) -> anyhow::Result<Vec<(NaiveDate, f64)>> {
            anyhow::bail!("model did not converge")
        }
    }

    fn series(n: usize) -> ArticleSeries {
        let start = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        ArticleSeries {
            article: "Sommerhut".to_string(),
            points: (0..n)
                .map(|i| SeriesPoint {
                    date: start + Duration::days(i as i64),
                    quantity: 10,
                })
                .collect(),
        }
    }

    #[test]
    fn requires_two_distinct_dates() {
        let adapter = ForecastAdapter::new(6);
        let result = adapter.run(&FixedEngine(vec![1.0; 6]), &series(1));
        assert!(!result.is_available());
        assert!(result
            .failure_reason()
            .unwrap()
            .contains("insufficient history"));
    }

    #[test]
    fn engine_error_becomes_failed_status() {
        let adapter = ForecastAdapter::new(6);
        let result = adapter.run(&FailingEngine, &series(4));
        assert!(!result.is_available());
        assert!(result.failure_reason().unwrap().contains("converge"));
    }

    #[test]
    fn clips_negatives_and_truncates_toward_zero() {
        let adapter = ForecastAdapter::new(4);
        let result = adapter.run(&FixedEngine(vec![3.9, -2.0, 0.4, 12.0]), &series(3));
        assert!(result.is_available());
        let quantities: Vec<u32> = result.points.iter().map(|p| p.quantity).collect();
        assert_eq!(quantities, vec![3, 0, 0, 12]);
    }

    #[test]
    fn emits_exactly_horizon_points() {
        let adapter = ForecastAdapter::new(6);
        let result = adapter.run(&FixedEngine(vec![1.0; 6]), &series(5));
        assert!(result.is_available());
        assert_eq!(result.points.len(), 6);
    }

    #[test]
    fn wrong_period_count_is_a_failure() {
        let adapter = ForecastAdapter::new(6);
        let result = adapter.run(&FixedEngine(vec![1.0; 4]), &series(5));
        assert!(!result.is_available());
        assert!(result.failure_reason().unwrap().contains("4 periods"));
    }
}
