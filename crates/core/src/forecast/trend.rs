//! Default forecasting engine: ordinary least-squares trend over the
//! observed history, projected at the period granularity past the last
//! observed date.

use crate::domain::article::ArticleSeries;
use crate::forecast::ForecastingEngine;
use anyhow::ensure;
use chrono::{Duration, NaiveDate};

#[derive(Debug, Clone)]
pub struct LeastSquaresTrend {
    /// Days between forecast periods (7 = weekly).
    pub period_days: i64,
}

impl Default for LeastSquaresTrend {
    fn default() -> Self {
        Self { period_days: 7 }
    }
}

impl ForecastingEngine for LeastSquaresTrend {
    fn name(&self) -> &'static str {
        "least_squares_trend"
    }

    fn forecast(
        &self,
        series: &ArticleSeries,
        horizon: usize,
    ) -> anyhow::Result<Vec<(NaiveDate, f64)>> {
        ensure!(
            series.points.len() >= 2,
            "least-squares trend needs at least 2 observations (got {})",
            series.points.len()
        );

        let origin = series.points[0].date;
        let n = series.points.len() as f64;

        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        for p in &series.points {
            sum_x += (p.date - origin).num_days() as f64;
            sum_y += f64::from(p.quantity);
        }
        let mean_x = sum_x / n;
        let mean_y = sum_y / n;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for p in &series.points {
            let dx = (p.date - origin).num_days() as f64 - mean_x;
            sxx += dx * dx;
            sxy += dx * (f64::from(p.quantity) - mean_y);
        }
        // Distinct dates make sxx > 0; guard anyway so a degenerate series
        // surfaces as a per-article failure instead of a NaN forecast.
        ensure!(sxx > 0.0, "history collapsed to a single date");

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;

        let last = series.last_date().expect("non-empty series");
        let mut out = Vec::with_capacity(horizon);
        for k in 1..=horizon as i64 {
            let date = last + Duration::days(self.period_days * k);
            let x = (date - origin).num_days() as f64;
            out.push((date, intercept + slope * x));
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::article::SeriesPoint;

    fn series(points: &[(u32, u32)]) -> ArticleSeries {
        ArticleSeries {
            article: "Sommerhut".to_string(),
            points: points
                .iter()
                .map(|&(day, quantity)| SeriesPoint {
                    date: NaiveDate::from_ymd_opt(2025, 8, day).unwrap(),
                    quantity,
                })
                .collect(),
        }
    }

    #[test]
    fn extends_a_linear_series_exactly() {
        // 20, 15, 10 at weekly spacing: slope is -5/7 per day.
        let s = series(&[(3, 20), (10, 15), (17, 10)]);
        let engine = LeastSquaresTrend::default();
        let out = engine.forecast(&s, 2).unwrap();

        assert_eq!(out[0].0, NaiveDate::from_ymd_opt(2025, 8, 24).unwrap());
        assert!((out[0].1 - 5.0).abs() < 1e-9);
        assert!((out[1].1 - 0.0).abs() < 1e-9);
    }

    #[test]
    fn declining_series_goes_negative_before_clipping() {
        let s = series(&[(3, 10), (10, 5)]);
        let engine = LeastSquaresTrend::default();
        let out = engine.forecast(&s, 3).unwrap();
        assert!(out[2].1 < 0.0);
    }

    #[test]
    fn flat_series_stays_flat() {
        let s = series(&[(3, 12), (10, 12), (17, 12)]);
        let engine = LeastSquaresTrend::default();
        let out = engine.forecast(&s, 4).unwrap();
        for (_, v) in out {
            assert!((v - 12.0).abs() < 1e-9);
        }
    }

    #[test]
    fn projects_weekly_from_last_observation() {
        let s = series(&[(3, 10), (10, 10)]);
        let engine = LeastSquaresTrend::default();
        let out = engine.forecast(&s, 6).unwrap();
        assert_eq!(out.len(), 6);
        assert_eq!(out[0].0, NaiveDate::from_ymd_opt(2025, 8, 17).unwrap());
        assert_eq!(out[5].0, NaiveDate::from_ymd_opt(2025, 9, 21).unwrap());
    }
}
