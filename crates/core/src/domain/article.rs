use anyhow::ensure;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One parsed input row: units sold of one article on one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesRecord {
    pub article: String,
    pub date: NaiveDate,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub quantity: u32,
}

/// Per-article sales history. Dates are strictly increasing; same-date
/// input rows have already been summed by the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleSeries {
    pub article: String,
    pub points: Vec<SeriesPoint>,
}

impl ArticleSeries {
    pub fn empty(article: impl Into<String>) -> Self {
        Self {
            article: article.into(),
            points: Vec::new(),
        }
    }

    pub fn distinct_dates(&self) -> usize {
        self.points.len()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

/// Purchase/sale price pair for one article. Articles missing either price
/// are excluded from scenario evaluation, never defaulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticlePrices {
    pub article: String,
    pub purchase_price: f64,
    pub sale_price: f64,
}

impl ArticlePrices {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.purchase_price > 0.0,
            "purchase_price must be positive for article {:?} (got {})",
            self.article,
            self.purchase_price
        );
        ensure!(
            self.sale_price > 0.0,
            "sale_price must be positive for article {:?} (got {})",
            self.article,
            self.sale_price
        );
        Ok(())
    }
}
