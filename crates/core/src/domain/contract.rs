use anyhow::{bail, ensure};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw per-article object as the recommendation engine returns it, before
/// validation. `scenario_comparison` is whatever the engine chose to echo;
/// it is never trusted for numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmOrderProposal {
    pub article: String,
    pub order_quantity: i64,
    pub action_recommendation: String,
    pub rationale: String,
    #[serde(default)]
    pub scenario_comparison: Option<serde_json::Value>,
}

/// Validated engine output for one article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineProposal {
    pub article: String,
    pub order_quantity: u32,
    pub action_recommendation: String,
    pub rationale: String,
    pub scenario_comparison: Option<serde_json::Value>,
}

/// Shape we accept when the engine echoes scenario figures back. Parsed only
/// to detect malformed per-article echoes; locally computed figures stay
/// authoritative either way.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineScenarioEcho {
    pub strategy: String,
    #[allow(dead_code)]
    pub revenue: f64,
    #[allow(dead_code)]
    pub profit: f64,
}

impl LlmOrderProposal {
    fn validate_and_into_proposal(self) -> anyhow::Result<EngineProposal> {
        let article = self.article.trim().to_string();
        ensure!(!article.is_empty(), "proposal article must be non-empty");

        ensure!(
            self.order_quantity >= 0,
            "order_quantity must be >= 0 for article {article:?} (got {})",
            self.order_quantity
        );
        let order_quantity = u32::try_from(self.order_quantity)?;

        let action_recommendation = self.action_recommendation.trim().to_string();
        ensure!(
            !action_recommendation.is_empty(),
            "action_recommendation must be non-empty for article {article:?}"
        );

        // Rationale is kept verbatim apart from surrounding whitespace.
        let rationale = self.rationale.trim().to_string();
        ensure!(
            !rationale.is_empty(),
            "rationale must be non-empty for article {article:?}"
        );

        Ok(EngineProposal {
            article,
            order_quantity,
            action_recommendation,
            rationale,
            scenario_comparison: self.scenario_comparison,
        })
    }
}

/// Validate a raw engine reply against the articles that were requested:
/// exactly one proposal per requested article, no duplicates, no extras.
/// Output is reordered to the requested article order.
pub fn validate_proposals(
    raw: Vec<LlmOrderProposal>,
    requested_articles: &[String],
) -> anyhow::Result<Vec<EngineProposal>> {
    ensure!(
        raw.len() == requested_articles.len(),
        "engine reply must contain exactly {} proposals (got {})",
        requested_articles.len(),
        raw.len()
    );

    let mut by_article = BTreeMap::<String, EngineProposal>::new();
    for proposal in raw {
        let proposal = proposal.validate_and_into_proposal()?;
        let article = proposal.article.clone();
        if by_article.insert(article.clone(), proposal).is_some() {
            bail!("duplicate proposal for article {article:?}");
        }
    }

    let mut out = Vec::with_capacity(requested_articles.len());
    for article in requested_articles {
        match by_article.remove(article) {
            Some(proposal) => out.push(proposal),
            None => bail!("engine reply is missing article {article:?}"),
        }
    }

    Ok(out)
}

/// Parse an engine scenario echo. A failure here is a per-article condition,
/// recovered by the caller with a warning.
pub fn parse_scenario_comparison(
    value: &serde_json::Value,
) -> anyhow::Result<Vec<EngineScenarioEcho>> {
    let echoes: Vec<EngineScenarioEcho> = serde_json::from_value(value.clone())?;
    for echo in &echoes {
        ensure!(
            !echo.strategy.trim().is_empty(),
            "scenario echo strategy must be non-empty"
        );
    }
    Ok(echoes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(article: &str) -> LlmOrderProposal {
        LlmOrderProposal {
            article: article.to_string(),
            order_quantity: 10,
            action_recommendation: "Abverkaufen".to_string(),
            rationale: "Nachfrage sinkt zum Saisonende.".to_string(),
            scenario_comparison: None,
        }
    }

    #[test]
    fn reorders_to_requested_order() {
        let requested = vec!["A".to_string(), "B".to_string()];
        let out = validate_proposals(vec![raw("B"), raw("A")], &requested).unwrap();
        assert_eq!(out[0].article, "A");
        assert_eq!(out[1].article, "B");
    }

    #[test]
    fn rejects_missing_article() {
        let requested = vec!["A".to_string(), "B".to_string()];
        let err = validate_proposals(vec![raw("A"), raw("C")], &requested).unwrap_err();
        assert!(format!("{err:#}").contains("missing article"));
    }

    #[test]
    fn rejects_duplicate_article() {
        let requested = vec!["A".to_string(), "B".to_string()];
        let err = validate_proposals(vec![raw("A"), raw("A")], &requested).unwrap_err();
        assert!(format!("{err:#}").contains("duplicate"));
    }

    #[test]
    fn rejects_negative_order_quantity() {
        let requested = vec!["A".to_string()];
        let mut p = raw("A");
        p.order_quantity = -3;
        assert!(validate_proposals(vec![p], &requested).is_err());
    }

    #[test]
    fn rejects_empty_rationale() {
        let requested = vec!["A".to_string()];
        let mut p = raw("A");
        p.rationale = "   ".to_string();
        assert!(validate_proposals(vec![p], &requested).is_err());
    }

    #[test]
    fn scenario_echo_accepts_expected_shape() {
        let v = json!([
            {"strategy": "baseline", "revenue": 1250.0, "profit": 750.0},
            {"strategy": "policy_discount", "revenue": 947.5, "profit": 447.5}
        ]);
        let echoes = parse_scenario_comparison(&v).unwrap();
        assert_eq!(echoes.len(), 2);
        assert_eq!(echoes[0].strategy, "baseline");
    }

    #[test]
    fn scenario_echo_rejects_prose() {
        let v = json!("baseline looks better");
        assert!(parse_scenario_comparison(&v).is_err());
    }
}
