use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastStatus {
    Ok,
    Failed { reason: String },
}

/// Per-article forecast over the run horizon. Created once per article per
/// run and never mutated afterwards; a failed forecast carries its reason
/// and an empty point list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResult {
    pub article: String,
    pub points: Vec<ForecastPoint>,
    pub status: ForecastStatus,
}

impl ForecastResult {
    pub fn ok(article: impl Into<String>, points: Vec<ForecastPoint>) -> Self {
        Self {
            article: article.into(),
            points,
            status: ForecastStatus::Ok,
        }
    }

    pub fn failed(article: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            article: article.into(),
            points: Vec::new(),
            status: ForecastStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.status, ForecastStatus::Ok)
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.status {
            ForecastStatus::Ok => None,
            ForecastStatus::Failed { reason } => Some(reason),
        }
    }

    pub fn total_quantity(&self) -> u64 {
        self.points.iter().map(|p| u64::from(p.quantity)).sum()
    }
}
