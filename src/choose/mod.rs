use serde::Deserialize;

use crate::provider::{CompletionRequest, Provider};
use crate::ux;

/// Outcome of asking the model to pick one item from a known set.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub file_name: String,
    #[serde(default)]
    pub reason: String,
}

/// Ask the model (JSON mode) to choose one `file_name` out of `candidates`.
/// An API error, unparseable JSON, or a hallucinated key outside the
/// candidate set all substitute the hardcoded default with a
/// human-readable justification.
pub async fn with_fallback(
    provider: &dyn Provider,
    model: &str,
    prompt: String,
    candidates: &[String],
    default: &str,
    fallback_reason: &str,
    debug: bool,
) -> Choice {
    let fallback = || Choice {
        file_name: default.to_string(),
        reason: fallback_reason.to_string(),
    };

    let req = CompletionRequest::json(model, prompt);
    let raw = match provider.complete(&req, debug).await {
        Ok(raw) => raw,
        Err(e) => {
            ux::warn(&format!("choice request failed: {e}"));
            return fallback();
        }
    };

    let cleaned = strip_code_fences(&raw);
    let parsed: Choice = match serde_json::from_str(&cleaned) {
        Ok(c) => c,
        Err(e) => {
            ux::warn(&format!("choice response was not valid JSON: {e}"));
            return fallback();
        }
    };

    if candidates.iter().any(|c| c == &parsed.file_name) {
        parsed
    } else {
        ux::warn(&format!(
            "model chose '{}', which is not a known candidate",
            parsed.file_name
        ));
        fallback()
    }
}

/// JSON-mode responses occasionally arrive wrapped in a markdown fence
/// anyway; strip it before parsing.
pub fn strip_code_fences(s: &str) -> String {
    s.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    struct CannedProvider {
        reply: Result<String, String>,
    }

    #[async_trait]
    impl Provider for CannedProvider {
        async fn complete(&self, _req: &CompletionRequest, _debug: bool) -> Result<String> {
            match &self.reply {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(anyhow!(e.clone())),
            }
        }
    }

    fn candidates() -> Vec<String> {
        vec!["vision/index.html".to_string(), "solutions/index.html".to_string()]
    }

    #[tokio::test]
    async fn accepts_valid_member_choice() {
        let provider = CannedProvider {
            reply: Ok(r#"{"file_name": "vision/index.html", "reason": "fewest articles"}"#.into()),
        };
        let choice = with_fallback(
            &provider, "m", "p".into(), &candidates(), "solutions/index.html", "fallback", false,
        )
        .await;
        assert_eq!(choice.file_name, "vision/index.html");
        assert_eq!(choice.reason, "fewest articles");
    }

    #[tokio::test]
    async fn falls_back_on_hallucinated_key() {
        let provider = CannedProvider {
            reply: Ok(r#"{"file_name": "made-up/index.html", "reason": "x"}"#.into()),
        };
        let choice = with_fallback(
            &provider, "m", "p".into(), &candidates(), "solutions/index.html", "fallback", false,
        )
        .await;
        assert_eq!(choice.file_name, "solutions/index.html");
        assert_eq!(choice.reason, "fallback");
    }

    #[tokio::test]
    async fn falls_back_on_bad_json_and_api_error() {
        for reply in [Ok("not json at all".to_string()), Err("boom".to_string())] {
            let provider = CannedProvider { reply };
            let choice = with_fallback(
                &provider, "m", "p".into(), &candidates(), "solutions/index.html", "fallback", false,
            )
            .await;
            assert_eq!(choice.file_name, "solutions/index.html");
        }
    }

    #[tokio::test]
    async fn parses_fenced_json() {
        let provider = CannedProvider {
            reply: Ok("```json\n{\"file_name\": \"solutions/index.html\", \"reason\": \"r\"}\n```".into()),
        };
        let choice = with_fallback(
            &provider, "m", "p".into(), &candidates(), "vision/index.html", "fallback", false,
        )
        .await;
        assert_eq!(choice.file_name, "solutions/index.html");
    }
}
