use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pagesmith", version, about = "LLM-driven static site generation and maintenance pipeline")]
pub struct Args {
    /// Project root; overrides the config-file value when given.
    #[arg(long)]
    pub root: Option<String>,

    /// Optional path to a pagesmith.toml config file.
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Skip interactive confirmations.
    #[arg(long, default_value_t = false)]
    pub yes: bool,

    #[arg(long, default_value_t = false)]
    pub save_request: bool,

    #[arg(long, default_value_t = false)]
    pub save_response: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initial build: identity, strategy, page list, full site generation.
    Build {
        /// Plain-text philosophy statement driving the identity synthesis.
        #[arg(long, default_value = "config/opinion.txt")]
        input: String,
    },
    /// Improvement cycle: analyze, pick a priority section, plan and
    /// generate new articles, refresh the section hub.
    Improve,
    /// Regenerate stub pages and refresh hub pages with tracking tags.
    Repair {
        #[command(flatten)]
        tags: TagIds,
    },
    /// Idempotently inject GTM/AdSense snippets into the on-disk site.
    Inject {
        #[command(flatten)]
        tags: TagIds,
    },
    /// Emit sitemap.xml from the persisted page plan.
    Sitemap,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TagIds {
    /// Google Tag Manager container id (GTM-XXXXXXX).
    #[arg(long)]
    pub gtm_id: Option<String>,

    /// Google AdSense client id (ca-pub-...).
    #[arg(long)]
    pub adsense_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_flag_is_absent_unless_given() {
        let args = Args::try_parse_from(["pagesmith", "sitemap"]).unwrap();
        assert_eq!(args.root, None);

        let args = Args::try_parse_from(["pagesmith", "--root", "/srv/site", "sitemap"]).unwrap();
        assert_eq!(args.root.as_deref(), Some("/srv/site"));
    }
}
