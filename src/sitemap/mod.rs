//! Sitemap emission from the persisted page plan.
//!
//! URL mapping: `index.html` → `<base>/`; `X/index.html` → `<base>/X/`;
//! any other file maps to `<base>/<file_name>` verbatim.

use anyhow::{Context, Result};
use chrono::Utc;
use fs_err as fs;
use std::borrow::Cow;
use std::path::Path;

use crate::plan::PagePlan;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

pub struct Sitemap {
    urls: Vec<UrlEntry>,
}

struct UrlEntry {
    loc: String,
    lastmod: String,
}

/// Map a planned file name to its public URL. Hub pages get the pretty
/// trailing-slash form.
pub fn page_url(base_url: &str, file_name: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if file_name == "index.html" {
        format!("{base}/")
    } else if let Some(dir) = file_name.strip_suffix("/index.html") {
        format!("{base}/{dir}/")
    } else {
        format!("{base}/{file_name}")
    }
}

impl Sitemap {
    pub fn build(base_url: &str, plans: &[PagePlan]) -> Self {
        let lastmod = Utc::now().format("%Y-%m-%d").to_string();
        let urls = plans
            .iter()
            .filter(|p| !p.file_name.is_empty())
            .map(|p| UrlEntry {
                loc: page_url(base_url, &p.file_name),
                lastmod: lastmod.clone(),
            })
            .collect();
        Self { urls }
    }

    fn into_xml(self) -> String {
        let mut xml = String::with_capacity(4096);

        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<urlset xmlns=\"");
        xml.push_str(SITEMAP_NS);
        xml.push_str("\">\n");

        for entry in self.urls {
            xml.push_str("  <url>\n    <loc>");
            xml.push_str(&escape_xml(&entry.loc));
            xml.push_str("</loc>\n    <lastmod>");
            xml.push_str(&entry.lastmod);
            xml.push_str("</lastmod>\n  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }

    pub fn write(self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let xml = self.into_xml();
        fs::write(path, xml)
            .with_context(|| format!("failed to write sitemap to {}", path.display()))?;
        Ok(())
    }
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://acme.example/site";

    #[test]
    fn hub_pages_map_to_trailing_slash() {
        assert_eq!(page_url(BASE, "index.html"), "https://acme.example/site/");
        assert_eq!(page_url(BASE, "vision/index.html"), "https://acme.example/site/vision/");
    }

    #[test]
    fn detail_pages_map_verbatim() {
        assert_eq!(
            page_url(BASE, "legal/privacy-policy.html"),
            "https://acme.example/site/legal/privacy-policy.html"
        );
        assert_eq!(
            page_url(BASE, "solutions/article-4.html"),
            "https://acme.example/site/solutions/article-4.html"
        );
    }

    #[test]
    fn trailing_slash_on_base_is_normalized() {
        assert_eq!(page_url("https://a.example/", "index.html"), "https://a.example/");
    }

    #[test]
    fn xml_contains_all_urls() {
        let plans = vec![
            PagePlan::new("Home", "index.html", ""),
            PagePlan::new("Vision", "vision/index.html", ""),
            PagePlan::new("Privacy", "legal/privacy-policy.html", ""),
        ];
        let xml = Sitemap::build(BASE, &plans).into_xml();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#)));
        assert!(xml.contains("<loc>https://acme.example/site/</loc>"));
        assert!(xml.contains("<loc>https://acme.example/site/vision/</loc>"));
        assert!(xml.contains("<loc>https://acme.example/site/legal/privacy-policy.html</loc>"));
        assert_eq!(xml.matches("<url>").count(), 3);
        assert!(xml.contains("<lastmod>"));
    }

    #[test]
    fn escapes_special_chars() {
        assert_eq!(escape_xml("plain"), "plain");
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(
            escape_xml(r#"<a href="x">'t'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&apos;t&apos;&lt;/a&gt;"
        );
    }
}
