use anyhow::{Context, Result};
use fs_err as fs;

use crate::choose::strip_code_fences;
use crate::config::Config;
use crate::errors::SiteError;
use crate::log::RunLog;
use crate::plan::PagePlan;
use crate::prompt;
use crate::provider::{CompletionRequest, Provider};

/// Hierarchical sitemap outline in Markdown.
pub async fn sitemap_outline(
    provider: &dyn Provider,
    cfg: &Config,
    identity: &str,
    log: &RunLog,
    debug: bool,
) -> Result<String> {
    println!("Generating the hierarchical sitemap outline...");
    let prompt = prompt::sitemap_outline(identity);
    let req = CompletionRequest::text(&cfg.flash_model, prompt.clone());
    let outline = provider
        .complete(&req, debug)
        .await
        .context("sitemap outline generation failed")?;
    log.save_phase("sitemap-outline", &prompt, &outline)?;
    Ok(outline)
}

/// Per-section content strategy brief in Markdown.
pub async fn content_strategy(
    provider: &dyn Provider,
    cfg: &Config,
    identity: &str,
    outline: &str,
    log: &RunLog,
    debug: bool,
) -> Result<String> {
    println!("Drafting the content strategy...");
    let prompt = prompt::content_strategy(identity, outline);
    let req = CompletionRequest::text(&cfg.flash_model, prompt.clone());
    let strategy = provider
        .complete(&req, debug)
        .await
        .context("content strategy generation failed")?;
    log.save_phase("content-strategy", &prompt, &strategy)?;
    Ok(strategy)
}

/// The full target page list, requested as JSON and normalized into
/// `PagePlan` records at the parse boundary.
pub async fn target_page_list(
    provider: &dyn Provider,
    cfg: &Config,
    identity: &str,
    strategy: &str,
    log: &RunLog,
    debug: bool,
) -> Result<Vec<PagePlan>> {
    println!("Deriving the target page list from the strategy...");
    let prompt = prompt::target_page_list(identity, strategy);
    let req = CompletionRequest::json(&cfg.flash_model, prompt.clone());
    let raw = provider
        .complete(&req, debug)
        .await
        .context("target page list generation failed")?;
    log.save_phase("target-page-list", &prompt, &raw)?;

    let plans: Vec<PagePlan> = serde_json::from_str(&strip_code_fences(&raw))
        .map_err(|e| SiteError::Malformed(format!("target page list was not a valid JSON array: {e}")))?;
    anyhow::ensure!(!plans.is_empty(), "target page list came back empty");
    Ok(plans)
}

/// Persist the human-review reports for sitemap and strategy, plus the
/// raw page list as JSON. The identity report is saved separately.
pub fn save_reports(cfg: &Config, outline: &str, strategy: &str, plans: &[PagePlan]) -> Result<()> {
    let dir = cfg.reports_dir();
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("02_sitemap.md"), outline)?;
    fs::write(dir.join("03_content_strategy.md"), strategy)?;
    fs::write(
        dir.join("04_target_pages_list.json"),
        serde_json::to_string_pretty(plans)?,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct CannedProvider(String);

    #[async_trait]
    impl Provider for CannedProvider {
        async fn complete(&self, _req: &CompletionRequest, _debug: bool) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn page_list_parses_and_normalizes_synonyms() {
        let provider = CannedProvider(
            r#"[
                {"title": "Home", "file_name": "index.html", "purpose": "entry"},
                {"title": "Vision", "file_name": "vision/index.html", "summary": "hub"}
            ]"#
            .to_string(),
        );
        let cfg = Config::default();
        let tmp = TempDir::new().unwrap();
        let log = RunLog::new(tmp.path(), false, false);

        let plans = target_page_list(&provider, &cfg, "id", "strategy", &log, false)
            .await
            .unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[1].purpose, "hub");
    }

    #[tokio::test]
    async fn empty_page_list_is_an_error() {
        let provider = CannedProvider("[]".to_string());
        let cfg = Config::default();
        let tmp = TempDir::new().unwrap();
        let log = RunLog::new(tmp.path(), false, false);

        let err = target_page_list(&provider, &cfg, "id", "strategy", &log, false).await;
        assert!(err.is_err());
    }
}
