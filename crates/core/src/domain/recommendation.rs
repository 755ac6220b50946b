use crate::domain::scenario::{ScenarioResult, StrategyKind};
use serde::{Deserialize, Serialize};

/// Why an article does or does not carry scenario economics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Evaluated,
    ForecastUnavailable,
    PricesUnavailable,
}

impl ScenarioStatus {
    /// Human-readable marker used in the exported table for articles without
    /// scenario economics.
    pub fn marker(self) -> &'static str {
        match self {
            ScenarioStatus::Evaluated => "",
            ScenarioStatus::ForecastUnavailable => "forecast unavailable",
            ScenarioStatus::PricesUnavailable => "prices unavailable",
        }
    }
}

/// Final per-article output record: the engine's recommendation merged with
/// the locally computed scenario economics. Local figures are authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecommendation {
    pub article: String,
    pub order_quantity: u32,
    pub action: String,
    pub rationale: String,
    pub scenarios: Vec<ScenarioResult>,
    pub best_strategy: Option<StrategyKind>,
    pub scenario_status: ScenarioStatus,
}
