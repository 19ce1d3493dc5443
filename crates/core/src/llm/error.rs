use crate::llm::Provider;
use serde_json::Value;

/// Where in a provider call things went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Non-success HTTP status.
    Http,
    /// A 2xx reply that carried no usable text.
    Response,
}

impl FailureStage {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureStage::Http => "http",
            FailureStage::Response => "response",
        }
    }
}

/// Upstream failure with whatever the provider sent back, so a failed trip
/// request can store it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{} call failed at {} stage: {detail}", .provider.as_str(), .stage.as_str())]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub stage: FailureStage,
    pub detail: String,
    pub raw_output: Option<String>,
    pub response_json: Option<Value>,
}

impl LlmDiagnosticsError {
    pub fn new(provider: Provider, stage: FailureStage, detail: impl Into<String>) -> Self {
        Self {
            provider,
            stage,
            detail: detail.into(),
            raw_output: None,
            response_json: None,
        }
    }

    /// Keeps the body text, and its JSON form when it parses.
    pub fn with_body(mut self, body: String) -> Self {
        self.response_json = serde_json::from_str(&body).ok();
        self.raw_output = Some(body);
        self
    }

    pub fn with_json(mut self, json: Value) -> Self {
        self.response_json = Some(json);
        self
    }
}
