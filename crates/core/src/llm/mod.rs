pub mod error;
pub mod gemini;
pub mod json;
pub mod prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
        }
    }
}

/// A generative-text backend: one prompt in, free text out.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate_text(&self, prompt: &str) -> anyhow::Result<String>;
}
