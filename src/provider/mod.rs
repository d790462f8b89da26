use anyhow::Result;
use async_trait::async_trait;

pub mod gemini;

/// A single text-completion request. `json` asks the service to respond
/// with `application/json` instead of free-form text.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub json: bool,
}

impl CompletionRequest {
    pub fn text(model: &str, prompt: String) -> Self {
        Self { model: model.to_string(), prompt, json: false }
    }

    pub fn json(model: &str, prompt: String) -> Self {
        Self { model: model.to_string(), prompt, json: true }
    }
}

#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(&self, req: &CompletionRequest, debug: bool) -> Result<String>;
}

pub type DynProvider = Box<dyn Provider + Send + Sync>;

pub fn make_provider(timeout_secs: u64) -> Result<DynProvider> {
    Ok(Box::new(gemini::GeminiProvider::from_env(timeout_secs)?))
}
