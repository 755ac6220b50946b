use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of competing sell-through strategies. Declaration order is
/// the tie-break order for best-strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Baseline,
    PolicyDiscount,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 2] = [StrategyKind::Baseline, StrategyKind::PolicyDiscount];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Baseline => "baseline",
            StrategyKind::PolicyDiscount => "policy_discount",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "baseline" => Some(StrategyKind::Baseline),
            "policy_discount" => Some(StrategyKind::PolicyDiscount),
            _ => None,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodPrice {
    pub date: NaiveDate,
    pub unit_price: f64,
}

/// One strategy applied to an article's forecast horizon: the effective unit
/// price for each forecast period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub kind: StrategyKind,
    pub period_prices: Vec<PeriodPrice>,
}

/// Projected economics of one strategy for one article. Derived each run,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub article: String,
    pub strategy: StrategyKind,
    pub revenue: f64,
    pub profit: f64,
}
