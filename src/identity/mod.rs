use anyhow::{Context, Result};
use fs_err as fs;

use crate::config::Config;
use crate::log::RunLog;
use crate::prompt;
use crate::provider::{CompletionRequest, Provider};
use crate::ux;

/// Last-resort persona used when neither the saved report nor the API is
/// available. Keeps downstream prompts functional.
const STUB_IDENTITY: &str =
    "Purpose: optimizing individual lives through data. Tone: logical, progressive.";

/// Synthesize the corporate persona document from the raw philosophy text.
pub async fn generate(
    provider: &dyn Provider,
    cfg: &Config,
    raw_input: &str,
    log: &RunLog,
    debug: bool,
) -> Result<String> {
    println!("Analyzing the philosophy text and forming the corporate persona...");
    let prompt = prompt::identity(raw_input);
    let req = CompletionRequest::text(&cfg.flash_model, prompt.clone());
    let identity = provider
        .complete(&req, debug)
        .await
        .context("corporate identity synthesis failed")?;
    log.save_phase("identity", &prompt, &identity)?;
    Ok(identity)
}

pub fn save(cfg: &Config, identity: &str) -> Result<()> {
    let path = cfg.identity_file();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, identity)
        .with_context(|| format!("failed to save identity to {}", path.display()))?;
    Ok(())
}

/// Load the persisted persona. Fallback chain on failure: regenerate from
/// the philosophy file via the API, else the hardcoded stub persona.
pub async fn load_or_regenerate(
    provider: &dyn Provider,
    cfg: &Config,
    input_file: &str,
    log: &RunLog,
    debug: bool,
) -> String {
    let path = cfg.identity_file();
    match fs::read_to_string(&path) {
        Ok(identity) => {
            ux::ok(&format!("loaded corporate identity from {}", path.display()));
            identity
        }
        Err(e) => {
            ux::warn(&format!("could not read {} ({e}); regenerating", path.display()));
            match fs::read_to_string(input_file) {
                Ok(raw) => match generate(provider, cfg, &raw, log, debug).await {
                    Ok(identity) => identity,
                    Err(e) => {
                        ux::warn(&format!("regeneration failed ({e}); using stub persona"));
                        STUB_IDENTITY.to_string()
                    }
                },
                Err(e) => {
                    ux::warn(&format!("could not read {input_file} ({e}); using stub persona"));
                    STUB_IDENTITY.to_string()
                }
            }
        }
    }
}
