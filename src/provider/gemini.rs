use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::{CompletionRequest, Provider};
use crate::errors::SiteError;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider talking to the `generateContent` REST endpoint.
pub struct GeminiProvider {
    api_key: String,
    client: Client,
    timeout_secs: u64,
}

impl GeminiProvider {
    pub fn from_env(timeout_secs: u64) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow!("GEMINI_API_KEY env var is not set"))?;
        Ok(Self { api_key, client: Client::new(), timeout_secs })
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn complete(&self, req: &CompletionRequest, debug: bool) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            API_BASE, req.model, self.api_key
        );

        let mut body = json!({
            "contents": [{ "parts": [{ "text": req.prompt }] }]
        });
        if req.json {
            body["generationConfig"] = json!({ "responseMimeType": "application/json" });
        }

        if debug {
            eprintln!("debug[gemini]: POST {}:generateContent (json={})", req.model, req.json);
        }

        let resp = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if debug {
            eprintln!("debug[gemini]: raw status: {}", status);
            eprintln!("debug[gemini]: raw response:\n{}", &text);
        }

        if !status.is_success() {
            return Err(SiteError::Provider(format!("Gemini API error ({status}): {text}")).into());
        }

        let parsed: Value = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse Gemini response: {e}\nRaw: {text}"))?;

        parsed["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| anyhow!("Gemini response contained no text part"))
    }
}
