//! Run orchestration: per-article evaluation, recommendation request
//! building, and final result assembly.
//!
//! All shared run state (policy, policy text, location, horizon) travels in
//! an explicit immutable `RunContext`; components never look anything up
//! ambiently.

use crate::domain::article::ArticlePrices;
use crate::domain::contract::{self, EngineProposal};
use crate::domain::forecast::ForecastResult;
use crate::domain::policy::DiscountPolicy;
use crate::domain::recommendation::{ArticleRecommendation, ScenarioStatus};
use crate::domain::scenario::{ScenarioResult, StrategyKind};
use crate::forecast::{ForecastAdapter, ForecastingEngine};
use crate::ingest::normalize::NormalizedInput;
use crate::llm::{ArticleFacts, GenerateInput, RecommendationEngine};
use crate::scenario;
use anyhow::{ensure, Context};

#[derive(Debug, Clone)]
pub struct RunContext {
    pub policy: DiscountPolicy,
    pub policy_text: String,
    pub location: String,
    pub horizon: usize,
}

impl RunContext {
    pub fn try_new(
        policy: DiscountPolicy,
        policy_text: String,
        location: String,
        horizon: usize,
    ) -> anyhow::Result<Self> {
        policy.validate()?;
        ensure!(horizon >= 1, "forecast horizon must be >= 1 (got {horizon})");
        Ok(Self {
            policy,
            policy_text,
            location,
            horizon,
        })
    }
}

/// Everything computed locally for one article, before the engine call.
#[derive(Debug, Clone)]
pub struct ArticleEvaluation {
    pub article: String,
    pub forecast: ForecastResult,
    pub prices: Option<ArticlePrices>,
    pub scenarios: Vec<ScenarioResult>,
    pub best_strategy: Option<StrategyKind>,
}

impl ArticleEvaluation {
    pub fn scenario_status(&self) -> ScenarioStatus {
        if self.prices.is_none() {
            ScenarioStatus::PricesUnavailable
        } else if !self.forecast.is_available() {
            ScenarioStatus::ForecastUnavailable
        } else {
            ScenarioStatus::Evaluated
        }
    }
}

/// Forecast and evaluate every article. Each iteration depends only on its
/// own series, the shared policy, and its own prices; failures stay local to
/// the article.
pub fn evaluate_articles(
    ctx: &RunContext,
    input: &NormalizedInput,
    engine: &dyn ForecastingEngine,
) -> Vec<ArticleEvaluation> {
    let adapter = ForecastAdapter::new(ctx.horizon);

    let mut out = Vec::with_capacity(input.article_order.len());
    for article in &input.article_order {
        let series = match input.series_for(article) {
            Some(series) => series,
            None => continue,
        };

        let forecast = adapter.run(engine, series);
        let prices = input.prices_for(article).cloned();

        let (scenarios, best_strategy) = match &prices {
            Some(prices) if forecast.is_available() => {
                let strategies = scenario::build_strategies(&ctx.policy, prices, &forecast);
                let results = scenario::evaluate(&forecast, &strategies, prices);
                let best = scenario::best_strategy(&results);
                (results, best)
            }
            Some(_) => {
                tracing::info!(%article, "forecast unavailable; skipping scenario evaluation");
                (Vec::new(), None)
            }
            None => {
                tracing::info!(%article, "prices unavailable; excluded from scenario evaluation");
                (Vec::new(), None)
            }
        };

        out.push(ArticleEvaluation {
            article: article.clone(),
            forecast,
            prices,
            scenarios,
            best_strategy,
        });
    }

    out
}

/// Recommendation request builder: every evaluated article gets a fact
/// bundle, failed forecasts and missing prices included as explicit markers.
pub fn build_request(
    ctx: &RunContext,
    evaluations: &[ArticleEvaluation],
) -> anyhow::Result<GenerateInput> {
    let facts = evaluations
        .iter()
        .map(|eval| ArticleFacts {
            article: eval.article.clone(),
            forecast: eval
                .forecast
                .is_available()
                .then(|| eval.forecast.points.clone()),
            forecast_failure: eval.forecast.failure_reason().map(str::to_string),
            purchase_price: eval.prices.as_ref().map(|p| p.purchase_price),
            sale_price: eval.prices.as_ref().map(|p| p.sale_price),
            scenarios: eval.scenarios.clone(),
            best_strategy: eval.best_strategy,
        })
        .collect();

    GenerateInput::try_new(
        facts,
        ctx.policy.clone(),
        ctx.policy_text.clone(),
        ctx.location.clone(),
    )
}

/// Result assembler: merge validated engine proposals with the local
/// evaluations, one record per input article in input order. Locally
/// computed scenario figures are authoritative; the engine's rationale is
/// kept verbatim and its scenario echo is only checked, never trusted.
pub fn assemble(
    evaluations: &[ArticleEvaluation],
    proposals: Vec<EngineProposal>,
) -> anyhow::Result<Vec<ArticleRecommendation>> {
    ensure!(
        proposals.len() == evaluations.len(),
        "proposal count {} does not match evaluated article count {}",
        proposals.len(),
        evaluations.len()
    );

    let mut out = Vec::with_capacity(evaluations.len());
    for (eval, proposal) in evaluations.iter().zip(proposals) {
        ensure!(
            proposal.article == eval.article,
            "proposal order mismatch: expected {:?}, got {:?}",
            eval.article,
            proposal.article
        );

        if let Some(echo) = &proposal.scenario_comparison {
            if let Err(err) = contract::parse_scenario_comparison(echo) {
                tracing::warn!(
                    article = %eval.article,
                    error = %format!("{err:#}"),
                    "malformed engine scenario comparison; keeping local figures only"
                );
            }
        }

        out.push(ArticleRecommendation {
            article: eval.article.clone(),
            order_quantity: proposal.order_quantity,
            action: proposal.action_recommendation,
            rationale: proposal.rationale,
            scenarios: eval.scenarios.clone(),
            best_strategy: eval.best_strategy,
            scenario_status: eval.scenario_status(),
        });
    }

    Ok(out)
}

/// One full run: evaluate, request, recommend, assemble.
pub async fn run(
    ctx: &RunContext,
    input: &NormalizedInput,
    forecaster: &dyn ForecastingEngine,
    engine: &dyn RecommendationEngine,
) -> anyhow::Result<Vec<ArticleRecommendation>> {
    let evaluations = evaluate_articles(ctx, input, forecaster);
    let request = build_request(ctx, &evaluations)?;
    let proposals = engine
        .recommend(&request)
        .await
        .context("recommendation engine call failed")?;
    assemble(&evaluations, proposals)
}
