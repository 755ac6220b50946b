//! Time series normalizer.
//!
//! Groups raw sales rows by exact article id, parses dates and quantities,
//! and emits one date-ascending series per article. Bad dates and negative
//! quantities cost one row each (collected, not fatal); unparseable price
//! values are fatal for the run. Same-date duplicates are summed so no data
//! is silently dropped.

use crate::domain::article::{ArticlePrices, ArticleSeries, SeriesPoint};
use crate::ingest::tables::SalesRow;
use anyhow::Context;
use chrono::NaiveDate;
use std::collections::BTreeMap;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d.%m.%Y"];

/// One rejected input row. `line` is the 1-based CSV line (header is line 1).
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub article: String,
    pub reason: String,
}

/// Normalizer output: per-article series and prices, keyed by exact article
/// id, plus the first-appearance article order used for all downstream
/// output ordering.
#[derive(Debug, Clone)]
pub struct NormalizedInput {
    pub article_order: Vec<String>,
    pub series: BTreeMap<String, ArticleSeries>,
    pub prices: BTreeMap<String, ArticlePrices>,
    pub row_errors: Vec<RowError>,
}

impl NormalizedInput {
    pub fn series_for(&self, article: &str) -> Option<&ArticleSeries> {
        self.series.get(article)
    }

    pub fn prices_for(&self, article: &str) -> Option<&ArticlePrices> {
        self.prices.get(article)
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

pub fn normalize(rows: &[SalesRow]) -> anyhow::Result<NormalizedInput> {
    let mut article_order = Vec::<String>::new();
    let mut quantities = BTreeMap::<String, BTreeMap<NaiveDate, u64>>::new();
    let mut prices = BTreeMap::<String, ArticlePrices>::new();
    let mut row_errors = Vec::new();

    for (idx, row) in rows.iter().enumerate() {
        let line = idx + 2;
        let article = row.article.trim().to_string();
        if article.is_empty() {
            row_errors.push(RowError {
                line,
                article,
                reason: "empty article id".to_string(),
            });
            continue;
        }

        if !article_order.contains(&article) {
            article_order.push(article.clone());
        }
        quantities.entry(article.clone()).or_default();

        // Prices are extracted even when the sales fields of the row turn out
        // to be bad; a present-but-unparseable price is a run-level input
        // error, not a row error.
        extract_prices(&mut prices, &article, row, line)?;

        let date = match parse_date(&row.date) {
            Some(date) => date,
            None => {
                row_errors.push(RowError {
                    line,
                    article,
                    reason: format!("unparseable date {:?}", row.date),
                });
                continue;
            }
        };

        let quantity = match row.quantity.trim().parse::<i64>() {
            Ok(q) if q >= 0 => q as u64,
            Ok(q) => {
                row_errors.push(RowError {
                    line,
                    article,
                    reason: format!("negative quantity {q}"),
                });
                continue;
            }
            Err(_) => {
                row_errors.push(RowError {
                    line,
                    article,
                    reason: format!("unparseable quantity {:?}", row.quantity),
                });
                continue;
            }
        };

        if let Some(by_date) = quantities.get_mut(&article) {
            *by_date.entry(date).or_insert(0) += quantity;
        }
    }

    for err in &row_errors {
        tracing::warn!(line = err.line, article = %err.article, reason = %err.reason, "rejected input row");
    }

    let mut series = BTreeMap::new();
    for article in &article_order {
        let by_date = &quantities[article];
        let points = by_date
            .iter()
            .map(|(&date, &quantity)| {
                let quantity = u32::try_from(quantity).with_context(|| {
                    format!("summed quantity overflows for article {article:?} on {date}")
                })?;
                Ok(SeriesPoint { date, quantity })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        series.insert(
            article.clone(),
            ArticleSeries {
                article: article.clone(),
                points,
            },
        );
    }

    Ok(NormalizedInput {
        article_order,
        series,
        prices,
        row_errors,
    })
}

fn extract_prices(
    prices: &mut BTreeMap<String, ArticlePrices>,
    article: &str,
    row: &SalesRow,
    line: usize,
) -> anyhow::Result<()> {
    let (purchase, sale) = match (&row.purchase_price, &row.sale_price) {
        (Some(p), Some(s)) => (p, s),
        (None, None) => return Ok(()),
        _ => {
            // One of the pair is missing: the article stays price-less rather
            // than getting a half-defaulted pair.
            tracing::warn!(
                line,
                article,
                "row carries only one of purchase_price/sale_price; ignoring"
            );
            return Ok(());
        }
    };

    let purchase_price: f64 = purchase
        .trim()
        .parse()
        .with_context(|| format!("unparseable purchase_price {purchase:?} at line {line}"))?;
    let sale_price: f64 = sale
        .trim()
        .parse()
        .with_context(|| format!("unparseable sale_price {sale:?} at line {line}"))?;

    let candidate = ArticlePrices {
        article: article.to_string(),
        purchase_price,
        sale_price,
    };
    candidate.validate()?;

    match prices.get(article) {
        None => {
            prices.insert(article.to_string(), candidate);
        }
        Some(existing) => {
            if existing.purchase_price != purchase_price || existing.sale_price != sale_price {
                tracing::warn!(
                    line,
                    article,
                    "conflicting price pair; keeping first occurrence"
                );
            }
        }
    }

    Ok(())
}
