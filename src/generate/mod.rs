use anyhow::{Context, Result};
use fs_err as fs;
use regex::Regex;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::errors::SiteError;
use crate::log::RunLog;
use crate::plan::PagePlan;
use crate::prompt;
use crate::provider::{CompletionRequest, Provider};
use crate::ux;

/// The completion must end with this exact sequence; anything else is
/// treated as a truncated or malformed attempt.
const TERMINATOR: &str = "</html>\n```eof";

/// Extract the page body from a raw completion. The contract with the
/// generation model: the output ends with the literal terminator and the
/// HTML sits inside a ```html fence closed by the ```eof marker.
pub fn extract_html(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !trimmed.ends_with(TERMINATOR) {
        return None;
    }
    let fence = Regex::new(r"(?s)```html\s*(.*?)\s*```eof").expect("static regex");
    fence
        .captures(trimmed)
        .map(|caps| caps[1].trim().to_string())
}

pub struct PageGenerator<'a> {
    pub provider: &'a dyn Provider,
    pub model: &'a str,
    pub identity: &'a str,
    pub retry_attempts: usize,
    pub gtm_id: Option<&'a str>,
    pub adsense_id: Option<&'a str>,
    pub debug: bool,
}

impl<'a> PageGenerator<'a> {
    /// Generate one page's HTML, retrying the bounded number of times on
    /// malformed output. Never returns partial HTML: either the extraction
    /// succeeds or the typed error is propagated.
    pub async fn generate(
        &self,
        page: &PagePlan,
        strategy: Option<&str>,
        nav_structure: &str,
        log: &RunLog,
    ) -> Result<String> {
        let prompt = prompt::page_html(
            page,
            self.identity,
            strategy,
            nav_structure,
            self.gtm_id,
            self.adsense_id,
        );
        let req = CompletionRequest::text(self.model, prompt.clone());

        for attempt in 1..=self.retry_attempts {
            println!(
                "  > generating HTML (attempt {}/{}) for {}",
                attempt, self.retry_attempts, page.file_name
            );
            match self.provider.complete(&req, self.debug).await {
                Ok(raw) => {
                    log.save_phase(
                        &format!("page-{}", page.file_name.replace('/', "_")),
                        &prompt,
                        &raw,
                    )?;
                    if let Some(html) = extract_html(&raw) {
                        return Ok(html);
                    }
                    ux::warn(&format!(
                        "output truncated or missing end marker for {}",
                        page.file_name
                    ));
                }
                Err(e) => {
                    ux::warn(&format!("generation attempt failed for {}: {e}", page.file_name));
                }
            }
        }

        Err(SiteError::GenerationExhausted {
            file_name: page.file_name.clone(),
            attempts: self.retry_attempts,
        }
        .into())
    }
}

/// Write a generated page under `base_dir`, creating parent directories and
/// going through a temp file so a crash never leaves a half-written page.
pub fn write_page(base_dir: &Path, file_name: &str, html: &str) -> Result<PathBuf> {
    let abs = base_dir.join(file_name);
    let parent = abs.parent().unwrap_or(base_dir);
    fs::create_dir_all(parent)?;
    let tmp = NamedTempFile::new_in(parent)?;
    fs::write(tmp.path(), html)?;
    tmp.persist(&abs)
        .with_context(|| format!("failed to persist {}", abs.display()))?;
    Ok(abs)
}
