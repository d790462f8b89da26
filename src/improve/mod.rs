use anyhow::{anyhow, Context, Result};
use walkdir::WalkDir;

use crate::analyze;
use crate::choose;
use crate::config::Config;
use crate::errors::SiteError;
use crate::generate::{write_page, PageGenerator};
use crate::identity;
use crate::log::RunLog;
use crate::plan::{self, nav_structure, PagePlan};
use crate::prompt;
use crate::provider::{CompletionRequest, Provider};
use crate::ux::{self, GenSummary};

const FALLBACK_SECTION: &str = "solutions/index.html";

/// Improvement cycle: analyze the current site, pick the most underserved
/// section, plan and generate new articles there, refresh the hub, and
/// re-save the plan ledger.
pub async fn run(
    cfg: &Config,
    provider: &dyn Provider,
    log: &RunLog,
    input_file: &str,
    debug: bool,
) -> Result<()> {
    ux::banner("improvement cycle");

    let identity = identity::load_or_regenerate(provider, cfg, input_file, log, debug).await;

    // AS-IS: prefer the persisted ledger; fall back to scanning the site
    // and re-inferring each page's purpose through the model.
    ux::phase("loading the current page plan");
    let plan_file = cfg.plan_file();
    let plans = match plan::load_markdown_table(&plan_file) {
        Ok(plans) => {
            ux::ok(&format!("loaded {} planned pages from {}", plans.len(), plan_file.display()));
            plans
        }
        Err(e) => {
            ux::warn(&format!("plan file unavailable ({e}); scanning the site instead"));
            scan_site(cfg, provider, &identity, debug).await?
        }
    };

    // Priority selection.
    ux::phase("selecting the priority section");
    let candidates: Vec<String> = plans.iter().map(|p| p.file_name.clone()).collect();
    let default = if candidates.iter().any(|c| c == FALLBACK_SECTION) {
        FALLBACK_SECTION.to_string()
    } else {
        plans
            .iter()
            .find(|p| p.is_hub())
            .or_else(|| plans.first())
            .map(|p| p.file_name.clone())
            .ok_or_else(|| anyhow!("page plan is empty"))?
    };
    let selection_prompt = prompt::priority_section(
        &analyze::section_balance(&plans),
        &identity,
        &analyze::pages_table(&plans),
        &analyze::placeholder_metrics(&plans),
    );
    let choice = choose::with_fallback(
        provider,
        &cfg.flash_model,
        selection_prompt,
        &candidates,
        &default,
        "Falling back to the core SOLUTIONS section: the model's selection was unusable.",
        debug,
    )
    .await;
    let section = plans
        .iter()
        .find(|p| p.file_name == choice.file_name)
        .cloned()
        .with_context(|| format!("plan has no record for {}", choice.file_name))?;
    println!("priority section: {} ({})", section.title, section.file_name);
    println!("reason: {}", choice.reason);

    // Article planning. Numbering starts past both the global article
    // count and the highest slug already present in the chosen section,
    // so a new article never overwrites an existing one.
    ux::phase("planning new articles");
    let section_dir = section.section();
    let base_dir = cfg.base_dir();
    let start_number = (plan::existing_article_count(&base_dir) + 1)
        .max(plan::next_article_number(&base_dir, section_dir));
    let plan_prompt = prompt::article_plan(&section, &identity, cfg.article_count, start_number);
    let req = CompletionRequest::json(&cfg.pro_model, plan_prompt.clone());
    let raw = provider
        .complete(&req, debug)
        .await
        .context("article planning failed")?;
    log.save_phase("article-plan", &plan_prompt, &raw)?;
    let mut new_articles: Vec<PagePlan> = serde_json::from_str(&choose::strip_code_fences(&raw))
        .map_err(|e| SiteError::Malformed(format!("article plan was not a valid JSON array: {e}")))?;
    anyhow::ensure!(!new_articles.is_empty(), "article planning produced no entries");

    // Planned slugs are bare file names; anchor them in the section dir.
    for article in &mut new_articles {
        if !section_dir.is_empty() && !article.file_name.contains('/') {
            article.file_name = format!("{}/{}", section_dir, article.file_name);
        }
    }
    ux::ok(&format!("{} articles planned for {}", new_articles.len(), section.title));

    // Article generation.
    ux::phase("generating new articles");
    let generator = PageGenerator {
        provider,
        model: &cfg.pro_model,
        identity: &identity,
        retry_attempts: cfg.retry_attempts,
        gtm_id: None,
        adsense_id: None,
        debug,
    };
    let nav = nav_structure(&plans);
    let mut summary = GenSummary::new();
    for article in &new_articles {
        println!("\n--- article: {} ({}) ---", article.title, article.file_name);
        match generator.generate(article, None, &nav, log).await {
            Ok(html) => match write_page(&cfg.base_dir(), &article.file_name, &html) {
                Ok(_) => summary.record_ok(&article.file_name),
                Err(e) => summary.record_err(&article.file_name, &e.to_string()),
            },
            Err(e) => summary.record_err(&article.file_name, &e.to_string()),
        }
    }

    // Hub refresh: regenerate the section hub with a table of contents
    // covering every sibling article, old and new.
    ux::phase("refreshing the section hub");
    let merged = plan::merge_plans(&plans, &new_articles);
    let siblings: Vec<&PagePlan> = merged
        .iter()
        .filter(|p| p.section() == section_dir && p.file_name != section.file_name)
        .collect();
    let links_html = if siblings.is_empty() {
        "<p>(no detail articles in this section yet)</p>".to_string()
    } else {
        let items: String = siblings
            .iter()
            .map(|p| {
                let href = p.file_name.rsplit('/').next().unwrap_or(&p.file_name);
                format!(
                    "<li><a href='{}' class='text-blue-500 hover:underline'>{}</a>: {}</li>",
                    href, p.title, p.purpose
                )
            })
            .collect();
        format!("<ul>{items}</ul>")
    };

    let mut hub = section.clone();
    hub.purpose = prompt::hub_refresh_purpose(&section, section_dir, &links_html, siblings.len());
    let hub_nav = nav_structure(&merged);
    match generator.generate(&hub, None, &hub_nav, log).await {
        Ok(html) => match write_page(&cfg.base_dir(), &hub.file_name, &html) {
            Ok(_) => summary.record_ok(&hub.file_name),
            Err(e) => summary.record_err(&hub.file_name, &e.to_string()),
        },
        Err(e) => summary.record_err(&hub.file_name, &e.to_string()),
    }
    summary.print("Improvement Results");

    plan::save_markdown_table(&merged, &plan_file)?;
    ux::ok(&format!("page plan re-saved to {}", plan_file.display()));

    Ok(())
}

/// Fallback AS-IS analysis: walk the site tree, digest each HTML file and
/// ask the model for a one-sentence strategic purpose per page.
async fn scan_site(
    cfg: &Config,
    provider: &dyn Provider,
    identity: &str,
    debug: bool,
) -> Result<Vec<PagePlan>> {
    let base_dir = cfg.base_dir();
    anyhow::ensure!(base_dir.is_dir(), "site directory {} not found", base_dir.display());

    let mut plans = Vec::new();
    for entry in WalkDir::new(&base_dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if !name.ends_with(".html") && !name.ends_with(".htm") {
            continue;
        }

        let path = entry.path();
        let analysis = match analyze::analyze_article(path) {
            Ok(a) => a,
            Err(e) => {
                ux::warn(&format!("analysis failed for {}: {e}", path.display()));
                continue;
            }
        };

        let purpose_prompt = prompt::article_purpose(&analysis, identity);
        let req = CompletionRequest::text(&cfg.flash_model, purpose_prompt);
        let purpose = match provider.complete(&req, debug).await {
            Ok(p) => p,
            Err(e) => {
                ux::warn(&format!("purpose inference failed for {}: {e}", path.display()));
                continue;
            }
        };

        let rel = path
            .strip_prefix(&base_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        plans.push(PagePlan::new(&analysis.page_title, &rel, &purpose));
    }

    anyhow::ensure!(!plans.is_empty(), "site scan found no HTML pages to analyze");
    ux::ok(&format!("re-inferred purposes for {} pages", plans.len()));
    Ok(plans)
}
