use anyhow::Result;
use clap::Parser;

mod analyze;
mod archive;
mod build;
mod choose;
mod cli;
mod config;
mod errors;
mod generate;
mod identity;
mod improve;
mod inject;
mod log;
mod plan;
mod prompt;
mod provider;
mod repair;
mod sitemap;
mod strategy;
mod ux;

/// Philosophy statement consulted when the persisted identity is missing.
const DEFAULT_INPUT: &str = "config/opinion.txt";

fn run_log(cfg: &config::Config, args: &cli::Args) -> log::RunLog {
    let log = log::RunLog::new(&cfg.reports_dir(), args.save_request, args.save_response);
    if args.save_request || args.save_response {
        ux::ok(&format!("run artifacts under {}", log.dir().display()));
    }
    log
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();

    let mut cfg = config::Config::load(args.config.as_deref())?;
    if let Some(root) = &args.root {
        cfg.root = root.clone();
    }

    match &args.command {
        cli::Command::Build { input } => {
            let provider = provider::make_provider(cfg.timeout_secs)?;
            let log = run_log(&cfg, &args);
            build::run(&cfg, provider.as_ref(), &log, input, args.yes, args.debug).await?;
        }
        cli::Command::Improve => {
            let provider = provider::make_provider(cfg.timeout_secs)?;
            let log = run_log(&cfg, &args);
            improve::run(&cfg, provider.as_ref(), &log, DEFAULT_INPUT, args.debug).await?;
        }
        cli::Command::Repair { tags } => {
            let (gtm, adsense) = ux::resolve_tag_ids(tags, !args.yes);
            let provider = provider::make_provider(cfg.timeout_secs)?;
            let log = run_log(&cfg, &args);
            repair::run(
                &cfg,
                provider.as_ref(),
                &log,
                DEFAULT_INPUT,
                gtm.as_deref(),
                adsense.as_deref(),
                args.debug,
            )
            .await?;
        }
        cli::Command::Inject { tags } => {
            let (gtm, adsense) = ux::resolve_tag_ids(tags, !args.yes);
            anyhow::ensure!(
                gtm.is_some() || adsense.is_some(),
                "neither a GTM id nor an AdSense id was provided"
            );
            let summary = inject::run(&cfg, gtm.as_deref(), adsense.as_deref())?;
            summary.print();
        }
        cli::Command::Sitemap => {
            let plans = plan::load_markdown_table(&cfg.plan_file())?;
            ux::ok(&format!("loaded {} planned pages", plans.len()));
            let path = cfg.base_dir().join("sitemap.xml");
            sitemap::Sitemap::build(&cfg.base_url, &plans).write(&path)?;
            ux::ok(&format!("sitemap written to {}", path.display()));
        }
    }

    Ok(())
}
