use anyhow::{anyhow, Context, Result};
use fs_err as fs;

use crate::errors::SiteError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::WalkDir;

/// One planned page. Historically the purpose text travelled under three
/// different keys (`purpose`, `summary`, `generated_purpose`); they are all
/// normalized to `purpose` at the deserialization boundary so downstream
/// code never has to chain fallbacks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PagePlan {
    pub title: String,
    pub file_name: String,
    #[serde(alias = "summary", alias = "generated_purpose", default)]
    pub purpose: String,
}

impl PagePlan {
    pub fn new(title: &str, file_name: &str, purpose: &str) -> Self {
        Self {
            title: title.to_string(),
            file_name: file_name.to_string(),
            purpose: purpose.to_string(),
        }
    }

    pub fn is_hub(&self) -> bool {
        self.file_name.ends_with("index.html")
    }

    /// Directory component of the file name ("" for root-level pages).
    pub fn section(&self) -> &str {
        match self.file_name.rfind('/') {
            Some(idx) => &self.file_name[..idx],
            None => "",
        }
    }
}

/// Render the nav context block embedded into generation prompts.
pub fn nav_structure(plans: &[PagePlan]) -> String {
    plans
        .iter()
        .map(|p| format!(" - {} ({})", p.title, p.file_name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Merge newly planned pages into the existing ledger. A colliding
/// file_name updates the existing record in place; everything else is
/// appended, so no record is ever dropped.
pub fn merge_plans(existing: &[PagePlan], new_plans: &[PagePlan]) -> Vec<PagePlan> {
    let mut merged = existing.to_vec();
    for plan in new_plans {
        match merged.iter_mut().find(|p| p.file_name == plan.file_name) {
            Some(slot) => {
                slot.title = plan.title.clone();
                slot.purpose = plan.purpose.clone();
            }
            None => merged.push(plan.clone()),
        }
    }
    merged
}

const TABLE_HEADING: &str = "## Content plan (existing + planned)";

fn sanitize_cell(s: &str) -> String {
    s.replace('\n', " ").replace('|', "/").trim().to_string()
}

/// Save the plan ledger as a Markdown table. This file is the durable
/// cross-run source of truth for "all planned pages".
pub fn save_markdown_table(plans: &[PagePlan], path: &Path) -> Result<()> {
    if plans.is_empty() {
        return Err(anyhow!("refusing to write an empty plan table"));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut out = String::new();
    out.push_str(TABLE_HEADING);
    out.push_str("\n\n");
    out.push_str("| File Name | Title | Purpose |\n");
    out.push_str("|---|---|---|\n");
    for p in plans {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            sanitize_cell(&p.file_name),
            sanitize_cell(&p.title),
            sanitize_cell(&p.purpose),
        ));
    }

    fs::write(path, out)
        .with_context(|| format!("failed to write plan table to {}", path.display()))?;
    Ok(())
}

/// Load the plan ledger back from its Markdown table. Header synonyms for
/// the purpose column ("Purpose", "Summary", "Generated Purpose") are all
/// accepted; bold markers are stripped from cells.
pub fn load_markdown_table(path: &Path) -> Result<Vec<PagePlan>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read plan table from {}", path.display()))?;
    parse_markdown_table(&content)
}

fn normalize_header(h: &str) -> Option<&'static str> {
    match h.to_lowercase().as_str() {
        "file name" | "file_name" | "file" => Some("file_name"),
        "title" => Some("title"),
        "purpose" | "summary" | "generated purpose" | "generated_purpose" => Some("purpose"),
        _ => None,
    }
}

pub fn parse_markdown_table(content: &str) -> Result<Vec<PagePlan>> {
    let lines: Vec<&str> = content.lines().collect();

    let header_idx = lines
        .iter()
        .position(|l| l.trim_start().starts_with('|') && l.to_lowercase().contains("file"))
        .ok_or_else(|| SiteError::Plan("no table header row found in plan file".into()))?;

    let split_row = |line: &str| -> Vec<String> {
        line.trim()
            .trim_matches('|')
            .split('|')
            .map(|c| c.trim().replace("**", ""))
            .collect()
    };

    let headers: Vec<Option<&'static str>> = split_row(lines[header_idx])
        .iter()
        .map(|h| normalize_header(h))
        .collect();

    // The separator row has cells made of '-' and ':' only; data cells that
    // merely contain dashes must survive.
    let is_separator_row = |cells: &[String]| {
        !cells.is_empty()
            && cells
                .iter()
                .all(|c| !c.is_empty() && c.chars().all(|ch| ch == '-' || ch == ':'))
    };

    let mut plans = Vec::new();
    for line in lines.iter().skip(header_idx + 1) {
        if !line.trim_start().starts_with('|') {
            continue;
        }
        let cells = split_row(line);
        if is_separator_row(&cells) {
            continue;
        }
        let mut plan = PagePlan::new("", "", "");
        for (i, cell) in cells.iter().enumerate() {
            match headers.get(i).copied().flatten() {
                Some("file_name") => plan.file_name = cell.clone(),
                Some("title") => plan.title = cell.clone(),
                Some("purpose") => plan.purpose = cell.clone(),
                _ => {}
            }
        }
        if !plan.file_name.is_empty() {
            plans.push(plan);
        }
    }

    if plans.is_empty() {
        return Err(SiteError::Plan("plan table contained no usable rows".into()).into());
    }
    Ok(plans)
}

/// Count HTML files under `base_dir`, excluding index pages. Used to pick
/// the starting number for newly planned article slugs.
pub fn existing_article_count(base_dir: &Path) -> usize {
    if !base_dir.is_dir() {
        return 0;
    }
    WalkDir::new(base_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy().to_lowercase();
            (name.ends_with(".html") || name.ends_with(".htm")) && name != "index.html"
        })
        .count()
}

/// Scan a section folder for `article-N.html` files and return max(N) + 1.
pub fn next_article_number(base_dir: &Path, section: &str) -> usize {
    let dir = base_dir.join(section);
    if !dir.is_dir() {
        return 1;
    }
    let pattern = Regex::new(r"(?i)^article-(\d+)\.html$").expect("static regex");
    let mut max_num = 0usize;
    if let Ok(entries) = fs::read_dir(&dir) {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(caps) = pattern.captures(&name) {
                if let Ok(n) = caps[1].parse::<usize>() {
                    max_num = max_num.max(n);
                }
            }
        }
    }
    max_num + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_plans() -> Vec<PagePlan> {
        vec![
            PagePlan::new("Home", "index.html", "Site entry point."),
            PagePlan::new("Vision", "vision/index.html", "Philosophy hub."),
            PagePlan::new("Privacy Policy", "legal/privacy-policy.html", "Utility page."),
        ]
    }

    #[test]
    fn table_round_trip_preserves_name_title_pairs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("planned_articles.md");
        let plans = sample_plans();

        save_markdown_table(&plans, &path).unwrap();
        let loaded = load_markdown_table(&path).unwrap();

        let pairs = |v: &[PagePlan]| {
            v.iter()
                .map(|p| (p.file_name.clone(), p.title.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(pairs(&plans), pairs(&loaded));
    }

    #[test]
    fn table_accepts_purpose_synonym_headers() {
        let content = "\
## Content plan

| File Name | Title | Summary |
|---|---|---|
| **vision/index.html** | Vision | Philosophy hub. |
";
        let plans = parse_markdown_table(content).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].file_name, "vision/index.html");
        assert_eq!(plans[0].purpose, "Philosophy hub.");
    }

    #[test]
    fn dash_bearing_cells_are_not_mistaken_for_the_separator() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("planned_articles.md");
        let plans = vec![
            PagePlan::new("Pros --- Cons", "insights/article-1.html", "Weighs trade-offs."),
            PagePlan::new("Plain", "insights/article-2.html", "No dashes here."),
        ];

        save_markdown_table(&plans, &path).unwrap();
        let loaded = load_markdown_table(&path).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].title, "Pros --- Cons");
        assert_eq!(loaded[0].file_name, "insights/article-1.html");
    }

    #[test]
    fn json_aliases_normalize_to_purpose() {
        let a: PagePlan =
            serde_json::from_str(r#"{"title":"A","file_name":"a.html","summary":"s"}"#).unwrap();
        let b: PagePlan =
            serde_json::from_str(r#"{"title":"B","file_name":"b.html","generated_purpose":"g"}"#)
                .unwrap();
        assert_eq!(a.purpose, "s");
        assert_eq!(b.purpose, "g");
    }

    #[test]
    fn merge_disjoint_never_drops_records() {
        let existing = sample_plans();
        let new_plans = vec![
            PagePlan::new("Article 4", "solutions/article-4.html", "New piece."),
            PagePlan::new("Article 5", "solutions/article-5.html", "Another piece."),
        ];
        let merged = merge_plans(&existing, &new_plans);
        assert_eq!(merged.len(), existing.len() + new_plans.len());
    }

    #[test]
    fn merge_collision_updates_in_place() {
        let existing = sample_plans();
        let update = vec![PagePlan::new("Vision v2", "vision/index.html", "Refreshed.")];
        let merged = merge_plans(&existing, &update);
        assert_eq!(merged.len(), existing.len());
        let slot = merged.iter().find(|p| p.file_name == "vision/index.html").unwrap();
        assert_eq!(slot.title, "Vision v2");
        assert_eq!(slot.purpose, "Refreshed.");
    }

    #[test]
    fn section_and_hub_detection() {
        let hub = PagePlan::new("Vision", "vision/index.html", "");
        let article = PagePlan::new("A", "solutions/article-2.html", "");
        let root = PagePlan::new("Home", "index.html", "");
        assert!(hub.is_hub());
        assert!(!article.is_hub());
        assert_eq!(hub.section(), "vision");
        assert_eq!(article.section(), "solutions");
        assert_eq!(root.section(), "");
    }

    #[test]
    fn next_article_number_scans_existing_slugs() {
        let dir = TempDir::new().unwrap();
        let section = dir.path().join("insights");
        std::fs::create_dir_all(&section).unwrap();
        std::fs::write(section.join("article-2.html"), "x").unwrap();
        std::fs::write(section.join("article-7.html"), "x").unwrap();
        std::fs::write(section.join("index.html"), "x").unwrap();

        assert_eq!(next_article_number(dir.path(), "insights"), 8);
        assert_eq!(next_article_number(dir.path(), "missing"), 1);
    }
}
