use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub root: String,
    pub base_dir: String,
    pub reports_dir: String,
    pub base_url: String,
    pub flash_model: String,
    pub pro_model: String,
    pub stub_threshold_bytes: u64,
    pub repair_count: usize,
    pub article_count: usize,
    pub retry_attempts: usize,
    pub timeout_secs: u64,
    pub archive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: ".".into(),
            base_dir: "docs".into(),
            reports_dir: "reports".into(),
            base_url: "https://example.github.io/site".into(),
            flash_model: "gemini-2.5-flash".into(),
            pro_model: "gemini-2.5-pro".into(),
            stub_threshold_bytes: 1024,
            repair_count: 3,
            article_count: 3,
            retry_attempts: 3,
            timeout_secs: 600,
            archive: true,
        }
    }
}

impl Config {
    /// Load from a TOML file if it exists, otherwise fall back to defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let candidate = path.unwrap_or("pagesmith.toml");
        if !Path::new(candidate).exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(candidate)
            .with_context(|| format!("failed to read config file {candidate}"))?;
        let cfg: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {candidate}"))?;
        Ok(cfg)
    }

    pub fn base_dir(&self) -> PathBuf {
        Path::new(&self.root).join(&self.base_dir)
    }

    pub fn reports_dir(&self) -> PathBuf {
        Path::new(&self.root).join(&self.reports_dir)
    }

    pub fn plan_file(&self) -> PathBuf {
        self.reports_dir().join("planned_articles.md")
    }

    pub fn identity_file(&self) -> PathBuf {
        self.reports_dir().join("01_corporate_identity.md")
    }

    pub fn archive_file(&self) -> PathBuf {
        let mut path = self.base_dir();
        path.set_extension("zip");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.stub_threshold_bytes, 1024);
        assert_eq!(cfg.retry_attempts, 3);
        assert_eq!(cfg.plan_file(), Path::new("./reports/planned_articles.md"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: Config = toml::from_str("base_url = \"https://acme.example\"").unwrap();
        assert_eq!(cfg.base_url, "https://acme.example");
        assert_eq!(cfg.base_dir, "docs");
        assert_eq!(cfg.repair_count, 3);
    }
}
