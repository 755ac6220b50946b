use crate::domain::contract::{self, EngineProposal, LlmOrderProposal};
use anyhow::Context;

/// Isolate the structured JSON array from an engine reply that may carry
/// surrounding prose or markdown fences. One bounded attempt; `None` means
/// the reply has no recoverable payload.
pub fn extract_json_array(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        // Remove Markdown fences (```json ... ``` or ``` ... ```).
        let mut inner = trimmed;
        if let Some(after_first) = inner.splitn(2, '\n').nth(1) {
            inner = after_first;
        }
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
        let inner = inner.trim();
        if !inner.is_empty() {
            return Some(inner.to_string());
        }
        return None;
    }

    // Outermost array delimiters: first '[' to last ']'.
    let start = trimmed.find('[')?;
    let end = trimmed.rfind(']')?;
    if end <= start {
        return None;
    }
    Some(trimmed[start..=end].trim().to_string())
}

/// Parse an engine reply into validated proposals for exactly the requested
/// articles. Isolation failure and schema mismatch are both fatal for the
/// recommendation step; the caller attaches the raw reply for diagnosis.
pub fn parse_proposals(
    text: &str,
    requested_articles: &[String],
) -> anyhow::Result<Vec<EngineProposal>> {
    let payload = extract_json_array(text)
        .context("engine reply contains no JSON array (payload isolation failed)")?;

    let raw: Vec<LlmOrderProposal> = serde_json::from_str(&payload)
        .with_context(|| format!("engine reply is not a valid proposal array: {payload}"))?;

    contract::validate_proposals(raw, requested_articles)
}
