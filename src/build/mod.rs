use anyhow::{Context, Result};
use fs_err as fs;

use crate::archive;
use crate::config::Config;
use crate::generate::{write_page, PageGenerator};
use crate::identity;
use crate::log::RunLog;
use crate::plan::{self, nav_structure};
use crate::provider::Provider;
use crate::strategy;
use crate::ux::{self, GenSummary};

/// Initial build: philosophy → identity → strategy → page list → full site.
pub async fn run(
    cfg: &Config,
    provider: &dyn Provider,
    log: &RunLog,
    input_file: &str,
    yes: bool,
    debug: bool,
) -> Result<()> {
    ux::banner("initial site build");

    let raw_input = fs::read_to_string(input_file)
        .with_context(|| format!("failed to read philosophy input {input_file}"))?;
    ux::ok(&format!("loaded philosophy statement from {input_file}"));

    let identity = identity::generate(provider, cfg, &raw_input, log, debug).await?;
    identity::save(cfg, &identity)?;
    ux::ok("corporate identity synthesized");

    let outline = strategy::sitemap_outline(provider, cfg, &identity, log, debug).await?;
    let content_strategy =
        strategy::content_strategy(provider, cfg, &identity, &outline, log, debug).await?;
    let plans =
        strategy::target_page_list(provider, cfg, &identity, &content_strategy, log, debug).await?;
    ux::ok(&format!("site strategy ready: {} target pages", plans.len()));

    strategy::save_reports(cfg, &outline, &content_strategy, &plans)?;
    ux::ok(&format!("strategy reports saved under {}", cfg.reports_dir().display()));

    let base_dir = cfg.base_dir();
    if base_dir.exists() {
        if !yes && !ux::confirm(&format!("{} exists and will be wiped. Continue?", base_dir.display())) {
            println!("Aborted by user.");
            return Ok(());
        }
        fs::remove_dir_all(&base_dir)?;
    }

    ux::phase("generating all pages");
    let nav = nav_structure(&plans);
    let generator = PageGenerator {
        provider,
        model: &cfg.pro_model,
        identity: &identity,
        retry_attempts: cfg.retry_attempts,
        gtm_id: None,
        adsense_id: None,
        debug,
    };

    let mut summary = GenSummary::new();
    for page in &plans {
        println!("\n--- page: {} ({}) ---", page.title, page.file_name);
        match generator.generate(page, Some(&content_strategy), &nav, log).await {
            Ok(html) => match write_page(&base_dir, &page.file_name, &html) {
                Ok(_) => summary.record_ok(&page.file_name),
                Err(e) => summary.record_err(&page.file_name, &e.to_string()),
            },
            Err(e) => summary.record_err(&page.file_name, &e.to_string()),
        }
    }
    summary.print("Build Results");

    plan::save_markdown_table(&plans, &cfg.plan_file())?;
    ux::ok(&format!("page plan saved to {}", cfg.plan_file().display()));

    if cfg.archive {
        let dest = cfg.archive_file();
        let count = archive::zip_dir(&base_dir, &dest)?;
        ux::ok(&format!("archived {} files to {}", count, dest.display()));
    }

    Ok(())
}
