//! CSV export of the final recommendation table, plus a reader for the same
//! table so exported runs can be re-imported losslessly.

use crate::domain::recommendation::ArticleRecommendation;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub article: String,
    pub order_quantity: u32,
    pub action_recommendation: String,
    pub rationale: String,
    /// Best strategy name, or the explicit marker for articles without
    /// scenario economics ("forecast unavailable" / "prices unavailable").
    pub best_strategy: String,
    /// "baseline=1250;policy_discount=947.5"
    pub revenue_per_strategy: String,
    pub profit_per_strategy: String,
}

impl ExportRow {
    pub fn from_recommendation(rec: &ArticleRecommendation) -> Self {
        let best_strategy = match rec.best_strategy {
            Some(kind) => kind.name().to_string(),
            None => rec.scenario_status.marker().to_string(),
        };

        let revenue_per_strategy = join_amounts(rec, |s| s.revenue);
        let profit_per_strategy = join_amounts(rec, |s| s.profit);

        Self {
            article: rec.article.clone(),
            order_quantity: rec.order_quantity,
            action_recommendation: rec.action.clone(),
            rationale: rec.rationale.clone(),
            best_strategy,
            revenue_per_strategy,
            profit_per_strategy,
        }
    }
}

fn join_amounts(
    rec: &ArticleRecommendation,
    amount: impl Fn(&crate::domain::scenario::ScenarioResult) -> f64,
) -> String {
    rec.scenarios
        .iter()
        .map(|s| format!("{}={}", s.strategy.name(), fmt_amount(amount(s))))
        .collect::<Vec<_>>()
        .join(";")
}

fn fmt_amount(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

pub fn write_recommendations<W: Write>(
    writer: W,
    recommendations: &[ArticleRecommendation],
) -> anyhow::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for rec in recommendations {
        csv_writer
            .serialize(ExportRow::from_recommendation(rec))
            .with_context(|| format!("failed to write row for article {:?}", rec.article))?;
    }
    csv_writer.flush().context("failed to flush CSV output")?;
    Ok(())
}

pub fn write_recommendations_file(
    path: &Path,
    recommendations: &[ArticleRecommendation],
) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_recommendations(file, recommendations)
}

pub fn read_recommendations<R: Read>(reader: R) -> anyhow::Result<Vec<ExportRow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for (idx, result) in csv_reader.deserialize().enumerate() {
        let row: ExportRow =
            result.with_context(|| format!("export table parse error at line {}", idx + 2))?;
        rows.push(row);
    }
    Ok(rows)
}
