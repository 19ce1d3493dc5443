use crate::config::{env_or, Settings};
use crate::llm::error::{FailureStage, LlmDiagnosticsError};
use crate::llm::{LlmClient, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;
const DEFAULT_TIMEOUT_SECS: u64 = 90;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_output_tokens: u32,
}

impl GeminiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_gemini_api_key()?.to_string();
        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_output_tokens = env_or("GEMINI_MAX_OUTPUT_TOKENS", DEFAULT_MAX_OUTPUT_TOKENS);
        let timeout_secs = env_or("GEMINI_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);

        Self::new(api_key, base_url, model, max_output_tokens, timeout_secs)
    }

    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        max_output_tokens: u32,
        timeout_secs: u64,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            max_output_tokens,
        })
    }

    async fn generate_content(
        &self,
        req: &GenerateContentRequest,
    ) -> anyhow::Result<(serde_json::Value, GenerateContentResponse)> {
        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", HeaderValue::from_str(&self.api_key)?);

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(req)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Gemini response body")?;
        if !status.is_success() {
            return Err(LlmDiagnosticsError::new(
                Provider::Gemini,
                FailureStage::Http,
                format!("status={status}"),
            )
            .with_body(text)
            .into());
        }

        let raw_json = serde_json::from_str::<serde_json::Value>(&text)
            .with_context(|| format!("failed to parse Gemini response JSON: {text}"))?;
        let parsed = serde_json::from_value::<GenerateContentResponse>(raw_json.clone())
            .context("failed to decode Gemini response into GenerateContentResponse")?;
        Ok((raw_json, parsed))
    }

    fn request(prompt: &str, max_output_tokens: u32) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig { max_output_tokens },
        }
    }

    fn finish_reason(res: &GenerateContentResponse) -> Option<&str> {
        res.candidates.first()?.finish_reason.as_deref()
    }

    fn response_text(res: &GenerateContentResponse) -> String {
        let Some(content) = res.candidates.first().and_then(|c| c.content.as_ref()) else {
            return String::new();
        };
        content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate_text(&self, prompt: &str) -> anyhow::Result<String> {
        let (mut raw_json, mut res) = self
            .generate_content(&Self::request(prompt, self.max_output_tokens))
            .await?;

        // If the model hit the token ceiling, retry once with a higher one.
        if Self::finish_reason(&res) == Some("MAX_TOKENS") {
            let bumped = self.max_output_tokens.saturating_mul(2);
            tracing::warn!(
                from = self.max_output_tokens,
                to = bumped,
                "Gemini finishReason=MAX_TOKENS; retrying once with higher maxOutputTokens"
            );
            let (rj, r) = self.generate_content(&Self::request(prompt, bumped)).await?;
            raw_json = rj;
            res = r;
        }

        let text = Self::response_text(&res);
        if text.trim().is_empty() {
            let detail = format!(
                "empty candidate text (finishReason={})",
                Self::finish_reason(&res).unwrap_or("none")
            );
            return Err(
                LlmDiagnosticsError::new(Provider::Gemini, FailureStage::Response, detail)
                    .with_json(raw_json)
                    .into(),
            );
        }
        Ok(text)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}
