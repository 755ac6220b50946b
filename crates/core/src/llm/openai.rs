use crate::config::Settings;
use crate::domain::contract::EngineProposal;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::json;
use crate::llm::{GenerateInput, Provider, RecommendationEngine};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_TEMPERATURE: f64 = 0.2;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_TRANSPORT_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f64,
    retries: u32,
}

impl OpenAiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_openai_api_key()?.to_string();
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let temperature = std::env::var("OPENAI_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(DEFAULT_TEMPERATURE);

        let timeout_secs = std::env::var("OPENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("OPENAI_TRANSPORT_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_TRANSPORT_RETRIES);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            temperature,
            retries,
        })
    }

    async fn create_chat_completion(
        &self,
        req: &ChatCompletionRequest,
    ) -> anyhow::Result<(serde_json::Value, ChatCompletionResponse)> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );

        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(req)
            .send()
            .await
            .context("OpenAI request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read OpenAI response body")?;
        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<serde_json::Value>(&text).ok();
            return Err(LlmDiagnosticsError {
                provider: Provider::OpenAi,
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
                raw_response_json,
            }
            .into());
        }

        let raw_json = serde_json::from_str::<serde_json::Value>(&text)
            .with_context(|| format!("failed to parse OpenAI response JSON: {text}"))?;
        let parsed = serde_json::from_value::<ChatCompletionResponse>(raw_json.clone())
            .context("failed to decode OpenAI response into ChatCompletionResponse")?;
        Ok((raw_json, parsed))
    }

    /// Retries cover the transport and HTTP stages only. A reply that arrives
    /// but cannot be parsed is a terminal payload error, never retried.
    async fn create_with_retries(
        &self,
        req: &ChatCompletionRequest,
    ) -> anyhow::Result<(serde_json::Value, ChatCompletionResponse)> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.create_chat_completion(req).await {
                Ok(out) => return Ok(out),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(attempt, ?backoff, error = %err, "OpenAI request failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    fn system_prompt(input: &GenerateInput) -> String {
        [
            "You are a merchandise planning analyst for seasonal retail articles.".to_string(),
            "Apply the following firm policy to every recommendation:".to_string(),
            input.policy_text.trim().to_string(),
            format!(
                "Structured sell-down policy: sell-down starts {}, phase-1 discount {}%, season ends {}, residual value {}% of purchase cost.",
                input.policy.sell_down_start,
                input.policy.phase1_discount_pct,
                input.policy.season_end,
                input.policy.residual_value_pct
            ),
            format!("Location context: {}", input.location),
            "Return ONLY a JSON array, one object per article, in any order.".to_string(),
            "Do not wrap the array in markdown. Do not add prose before or after it.".to_string(),
            "Each object must have exactly these keys:".to_string(),
            "- \"article\": the article id, copied verbatim from the input".to_string(),
            "- \"order_quantity\": recommended reorder quantity, integer >= 0".to_string(),
            "- \"action_recommendation\": short free-text action (e.g. discount, sell down, hold price)".to_string(),
            "- \"rationale\": 1-2 sentence justification".to_string(),
            "- optionally \"scenario_comparison\": array of {strategy, revenue, profit}".to_string(),
            "Cover every input article exactly once, including articles whose forecast or prices are marked unavailable.".to_string(),
        ]
        .join("\n")
    }

    fn user_prompt(input: &GenerateInput) -> String {
        format!("Article facts JSON:\n{}", input.facts_json())
    }

    fn response_text(res: &ChatCompletionResponse) -> anyhow::Result<String> {
        let choice = res
            .choices
            .first()
            .context("OpenAI response has no choices")?;
        let content = choice
            .message
            .content
            .as_deref()
            .context("OpenAI response message has no content")?;
        anyhow::ensure!(
            !content.trim().is_empty(),
            "OpenAI response content is empty"
        );
        Ok(content.to_string())
    }
}

#[async_trait::async_trait]
impl RecommendationEngine for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    async fn recommend(&self, input: &GenerateInput) -> anyhow::Result<Vec<EngineProposal>> {
        let req = ChatCompletionRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages: vec![
                Message {
                    role: "system",
                    content: Self::system_prompt(input),
                },
                Message {
                    role: "user",
                    content: Self::user_prompt(input),
                },
            ],
        };

        let (raw_json, res) = self.create_with_retries(&req).await?;
        let text = Self::response_text(&res)?;

        let requested = input.articles();
        json::parse_proposals(&text, &requested).map_err(|err| {
            LlmDiagnosticsError {
                provider: Provider::OpenAi,
                stage: "parse",
                detail: format!("{err:#}"),
                raw_output: Some(text),
                raw_response_json: Some(raw_json),
            }
            .into()
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f64,
    messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_chat_completion_response() {
        let v = json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": {"role": "assistant", "content": "[{\"a\":1}]"},
                    "finish_reason": "stop"
                }
            ]
        });

        let res: ChatCompletionResponse = serde_json::from_value(v).unwrap();
        let text = OpenAiClient::response_text(&res).unwrap();
        assert_eq!(text, "[{\"a\":1}]");
    }

    #[test]
    fn empty_content_is_an_error() {
        let v = json!({
            "choices": [
                {"message": {"role": "assistant", "content": ""}}
            ]
        });
        let res: ChatCompletionResponse = serde_json::from_value(v).unwrap();
        assert!(OpenAiClient::response_text(&res).is_err());
    }

    #[test]
    fn missing_choices_is_an_error() {
        let v = json!({"choices": []});
        let res: ChatCompletionResponse = serde_json::from_value(v).unwrap();
        assert!(OpenAiClient::response_text(&res).is_err());
    }
}
