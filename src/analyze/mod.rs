use anyhow::{anyhow, Context, Result};
use fs_err as fs;
use std::collections::BTreeMap;
use std::path::Path;

use crate::plan::PagePlan;

/// Structural digest of an existing article, fed back to the model when a
/// page's strategic purpose has to be re-inferred.
#[derive(Debug, Clone)]
pub struct ArticleAnalysis {
    pub page_title: String,
    pub structure: String,
    pub excerpt: String,
}

const EXCERPT_CHARS: usize = 500;
const STRIPPED_TAGS: [&str; 5] = ["script", "style", "nav", "header", "footer"];

/// Parse an HTML file and extract its title, heading outline and a short
/// body excerpt with boilerplate tags stripped.
pub fn analyze_article(path: &Path) -> Result<ArticleAnalysis> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let dom = tl::parse(&content, tl::ParserOptions::default())
        .map_err(|e| anyhow!("failed to parse {}: {e}", path.display()))?;
    let parser = dom.parser();

    let fallback_title = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let page_title = dom
        .query_selector("title")
        .and_then(|mut it| it.next())
        .and_then(|h| h.get(parser))
        .and_then(|n| n.as_tag())
        .map(|t| t.inner_text(parser).to_string())
        .unwrap_or(fallback_title);
    // Sites commonly suffix "| Brand"; keep the page part only.
    let page_title = page_title
        .split('|')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    let mut headings = Vec::new();
    if let Some(main) = dom
        .query_selector("main")
        .and_then(|mut it| it.next())
        .and_then(|h| h.get(parser))
        .and_then(|n| n.as_tag())
    {
        collect_headings(main, parser, &mut headings);
    }

    let mut text = String::new();
    for handle in dom.children() {
        if let Some(node) = handle.get(parser) {
            collect_text(node, parser, &mut text);
        }
    }
    let excerpt: String = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(EXCERPT_CHARS)
        .collect::<String>()
        + "...";

    Ok(ArticleAnalysis {
        page_title,
        structure: headings.join("\n"),
        excerpt,
    })
}

fn collect_headings(tag: &tl::HTMLTag, parser: &tl::Parser, out: &mut Vec<String>) {
    for handle in tag.children().top().iter() {
        let Some(node) = handle.get(parser) else { continue };
        if let Some(child) = node.as_tag() {
            let name = child.name().as_utf8_str().to_lowercase();
            if name == "h1" || name == "h2" || name == "h3" {
                out.push(format!("<{}> {}", name, child.inner_text(parser).trim()));
            }
            collect_headings(child, parser, out);
        }
    }
}

fn collect_text(node: &tl::Node, parser: &tl::Parser, out: &mut String) {
    match node {
        tl::Node::Tag(tag) => {
            let name = tag.name().as_utf8_str().to_lowercase();
            if STRIPPED_TAGS.contains(&name.as_str()) {
                return;
            }
            for handle in tag.children().top().iter() {
                if let Some(child) = handle.get(parser) {
                    collect_text(child, parser, out);
                }
            }
        }
        tl::Node::Raw(bytes) => {
            let text = bytes.as_utf8_str();
            if !text.trim().is_empty() {
                out.push_str(&text);
                out.push('\n');
            }
        }
        tl::Node::Comment(_) => {}
    }
}

/// Article count per section, rendered for the priority-selection prompt.
/// Root-level and utility sections are listed too; the prompt tells the
/// model to ignore them.
pub fn section_balance(plans: &[PagePlan]) -> String {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for plan in plans {
        if plan.is_hub() {
            counts.entry(plan.section().to_string()).or_insert(0);
        } else {
            *counts.entry(plan.section().to_string()).or_insert(0) += 1;
        }
    }
    counts
        .iter()
        .map(|(section, count)| {
            let label = if section.is_empty() { "(root)" } else { section.as_str() };
            format!("- {}: {} articles", label, count)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Markdown table of every page's purpose, reference context for choice
/// prompts.
pub fn pages_table(plans: &[PagePlan]) -> String {
    let mut out = String::from("| File Name | Title | Purpose |\n|---|---|---|\n");
    for p in plans {
        out.push_str(&format!("| {} | {} | {} |\n", p.file_name, p.title, p.purpose));
    }
    out
}

/// Uniform dummy performance rows. Real analytics never existed upstream;
/// the table only anchors the prompt's "data is uniform" caveat.
pub fn placeholder_metrics(plans: &[PagePlan]) -> String {
    let mut out = String::from(
        "| Article_Title | CVR | ReadRate_90 | Keywords | Total_Sessions_30D |\n|---|---|---|---|---|\n",
    );
    for p in plans {
        out.push_str(&format!("| {} | 1.5 | 30 | no data | 2500 |\n", p.title));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"<!DOCTYPE html>
<html>
<head><title>PDCA Basics | Acme</title><script>var x = 1;</script></head>
<body>
<header><nav>Home</nav></header>
<main>
  <h1>PDCA Basics</h1>
  <section><h2>Why it works</h2><p>Iterate with data.</p></section>
</main>
<footer>Copyright</footer>
</body>
</html>"#;

    #[test]
    fn extracts_title_headings_and_excerpt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("article.html");
        std::fs::write(&path, SAMPLE).unwrap();

        let analysis = analyze_article(&path).unwrap();
        assert_eq!(analysis.page_title, "PDCA Basics");
        assert!(analysis.structure.contains("<h1> PDCA Basics"));
        assert!(analysis.structure.contains("<h2> Why it works"));
        assert!(analysis.excerpt.contains("Iterate with data."));
        // script/nav/footer content is stripped from the excerpt
        assert!(!analysis.excerpt.contains("var x"));
        assert!(!analysis.excerpt.contains("Copyright"));
    }

    #[test]
    fn balance_counts_articles_per_section() {
        let plans = vec![
            PagePlan::new("Vision", "vision/index.html", ""),
            PagePlan::new("V1", "vision/article-1.html", ""),
            PagePlan::new("V2", "vision/article-2.html", ""),
            PagePlan::new("Solutions", "solutions/index.html", ""),
        ];
        let report = section_balance(&plans);
        assert!(report.contains("- vision: 2 articles"));
        assert!(report.contains("- solutions: 0 articles"));
    }
}
