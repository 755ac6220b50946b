pub mod error;
pub mod json;
pub mod openai;

use crate::domain::contract::EngineProposal;
use crate::domain::forecast::ForecastPoint;
use crate::domain::policy::DiscountPolicy;
use crate::domain::scenario::{ScenarioResult, StrategyKind};
use anyhow::ensure;

/// Per-article fact bundle handed to the recommendation engine. Articles
/// with failed forecasts keep their slot (forecast absent, reason attached)
/// so the engine can still reason qualitatively.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ArticleFacts {
    pub article: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Vec<ForecastPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_failure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<f64>,
    pub scenarios: Vec<ScenarioResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_strategy: Option<StrategyKind>,
}

/// Full request to the recommendation engine: one fact bundle per article
/// plus the shared policy and location context.
#[derive(Debug, Clone)]
pub struct GenerateInput {
    pub facts: Vec<ArticleFacts>,
    pub policy: DiscountPolicy,
    pub policy_text: String,
    pub location: String,
}

impl GenerateInput {
    pub fn try_new(
        facts: Vec<ArticleFacts>,
        policy: DiscountPolicy,
        policy_text: String,
        location: String,
    ) -> anyhow::Result<Self> {
        ensure!(!facts.is_empty(), "request must cover at least one article");
        policy.validate()?;
        Ok(Self {
            facts,
            policy,
            policy_text,
            location,
        })
    }

    pub fn articles(&self) -> Vec<String> {
        self.facts.iter().map(|f| f.article.clone()).collect()
    }

    pub fn facts_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.facts).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone)]
pub enum Provider {
    OpenAi,
}

#[async_trait::async_trait]
pub trait RecommendationEngine: Send + Sync {
    fn provider(&self) -> Provider;

    async fn recommend(&self, input: &GenerateInput) -> anyhow::Result<Vec<EngineProposal>>;
}
