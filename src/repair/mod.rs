use anyhow::{Context, Result};
use std::path::Path;

use crate::analyze;
use crate::choose;
use crate::config::Config;
use crate::generate::{write_page, PageGenerator};
use crate::identity;
use crate::log::RunLog;
use crate::plan::{self, nav_structure, PagePlan};
use crate::prompt;
use crate::provider::Provider;
use crate::ux::{self, GenSummary};

/// A planned page whose file exists on disk, is not an index page, and is
/// below the byte threshold counts as an incomplete stub.
pub fn find_stubs(plans: &[PagePlan], base_dir: &Path, threshold: u64) -> Vec<PagePlan> {
    plans
        .iter()
        .filter(|p| !p.is_hub())
        .filter(|p| {
            let path = base_dir.join(&p.file_name);
            match path.metadata() {
                Ok(meta) => meta.is_file() && meta.len() < threshold,
                Err(_) => false,
            }
        })
        .cloned()
        .collect()
}

/// Repair run: regenerate the highest-priority stubs, then unconditionally
/// regenerate every hub page so links and tracking tags are fresh.
pub async fn run(
    cfg: &Config,
    provider: &dyn Provider,
    log: &RunLog,
    input_file: &str,
    gtm_id: Option<&str>,
    adsense_id: Option<&str>,
    debug: bool,
) -> Result<()> {
    ux::banner("site repair");

    let identity = identity::load_or_regenerate(provider, cfg, input_file, log, debug).await;

    let plan_file = cfg.plan_file();
    let plans = plan::load_markdown_table(&plan_file)
        .with_context(|| format!("plan file {} is required for repair", plan_file.display()))?;
    ux::ok(&format!("loaded {} planned pages", plans.len()));

    let base_dir = cfg.base_dir();
    anyhow::ensure!(base_dir.is_dir(), "site directory {} not found", base_dir.display());

    ux::phase("detecting stub articles");
    let stubs = find_stubs(&plans, &base_dir, cfg.stub_threshold_bytes);
    ux::ok(&format!(
        "{} stub articles under {} bytes",
        stubs.len(),
        cfg.stub_threshold_bytes
    ));

    let generator = PageGenerator {
        provider,
        model: &cfg.pro_model,
        identity: &identity,
        retry_attempts: cfg.retry_attempts,
        gtm_id,
        adsense_id,
        debug,
    };
    let nav = nav_structure(&plans);
    let mut summary = GenSummary::new();

    if stubs.is_empty() {
        println!("No stub articles to repair; hub pages will still be refreshed.");
    } else {
        // Let the model pick the most urgent stub, then fill the batch
        // with the remaining ones in plan order.
        ux::phase("prioritizing repairs");
        let candidates: Vec<String> = stubs.iter().map(|p| p.file_name.clone()).collect();
        let selection_prompt = prompt::priority_section(
            &analyze::section_balance(&plans),
            &identity,
            &analyze::pages_table(&stubs),
            &analyze::placeholder_metrics(&stubs),
        );
        let choice = choose::with_fallback(
            provider,
            &cfg.flash_model,
            selection_prompt,
            &candidates,
            &candidates[0],
            "Falling back to the first detected stub: the model's selection was unusable.",
            debug,
        )
        .await;
        println!("priority repair: {} ({})", choice.file_name, choice.reason);

        let mut batch: Vec<PagePlan> = Vec::with_capacity(cfg.repair_count);
        if let Some(first) = stubs.iter().find(|p| p.file_name == choice.file_name) {
            batch.push(first.clone());
        }
        for stub in &stubs {
            if batch.len() >= cfg.repair_count {
                break;
            }
            if batch.iter().all(|p| p.file_name != stub.file_name) {
                batch.push(stub.clone());
            }
        }

        ux::phase(&format!("regenerating {} stub articles", batch.len()));
        for (i, page) in batch.iter().enumerate() {
            println!("\n--- repair {}/{}: {} ({}) ---", i + 1, batch.len(), page.title, page.file_name);
            match generator.generate(page, None, &nav, log).await {
                Ok(html) => match write_page(&base_dir, &page.file_name, &html) {
                    Ok(_) => summary.record_ok(&page.file_name),
                    Err(e) => summary.record_err(&page.file_name, &e.to_string()),
                },
                Err(e) => summary.record_err(&page.file_name, &e.to_string()),
            }
        }
    }

    // Hub pages are regenerated regardless so outbound links stay current
    // and tracking tags land in the right positions.
    ux::phase("refreshing hub pages");
    let hubs: Vec<&PagePlan> = plans.iter().filter(|p| p.is_hub()).collect();
    println!("{} hub pages to refresh", hubs.len());
    for hub in hubs {
        println!("\n--- hub refresh: {} ---", hub.file_name);
        let mut page = hub.clone();
        page.purpose = prompt::hub_tag_purpose(&hub.purpose, gtm_id, adsense_id);
        match generator.generate(&page, None, &nav, log).await {
            Ok(html) => match write_page(&base_dir, &page.file_name, &html) {
                Ok(_) => summary.record_ok(&page.file_name),
                Err(e) => summary.record_err(&page.file_name, &e.to_string()),
            },
            Err(e) => summary.record_err(&page.file_name, &e.to_string()),
        }
    }

    summary.print("Repair Results");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(base: &Path, rel: &str, size: usize) {
        let path = base.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "x".repeat(size)).unwrap();
    }

    #[test]
    fn files_under_threshold_are_stubs() {
        let tmp = TempDir::new().unwrap();
        let plans = vec![
            PagePlan::new("Small", "solutions/article-1.html", ""),
            PagePlan::new("Exact", "solutions/article-2.html", ""),
            PagePlan::new("Big", "solutions/article-3.html", ""),
        ];
        write(tmp.path(), "solutions/article-1.html", 1023);
        write(tmp.path(), "solutions/article-2.html", 1024);
        write(tmp.path(), "solutions/article-3.html", 4096);

        let stubs = find_stubs(&plans, tmp.path(), 1024);
        let names: Vec<&str> = stubs.iter().map(|p| p.file_name.as_str()).collect();
        assert_eq!(names, vec!["solutions/article-1.html"]);
    }

    #[test]
    fn index_and_missing_files_are_not_stubs() {
        let tmp = TempDir::new().unwrap();
        let plans = vec![
            PagePlan::new("Hub", "vision/index.html", ""),
            PagePlan::new("Missing", "vision/article-1.html", ""),
        ];
        write(tmp.path(), "vision/index.html", 10);

        assert!(find_stubs(&plans, tmp.path(), 1024).is_empty());
    }
}
