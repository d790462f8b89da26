use anyhow::Result;
use fs_err as fs;
use regex::Regex;
use walkdir::WalkDir;

use crate::config::Config;
use crate::ux::{self, InjectSummary};

const GTM_HEAD_TEMPLATE: &str = r#"<script>(function(w,d,s,l,i){w[l]=w[l]||[];w[l].push({'gtm.start':
new Date().getTime(),event:'gtm.js'});var f=d.getElementsByTagName(s)[0],
j=d.createElement(s),dl=l!='dataLayer'?'&l='+l:'';j.async=true;j.src=
'https://www.googletagmanager.com/gtm.js?id='+i+dl;f.parentNode.insertBefore(j,f);
})(window,document,'script','dataLayer','{GTM_ID}');</script>"#;

const GTM_BODY_TEMPLATE: &str = r#"<noscript><iframe src="https://www.googletagmanager.com/ns.html?id={GTM_ID}"
height="0" width="0" style="display:none;visibility:hidden"></iframe></noscript>"#;

const ADSENSE_HEAD_TEMPLATE: &str = r#"<script async src="https://pagead2.googlesyndication.com/pagead/js/adsbygoogle.js?client={ADSENSE_CLIENT_ID}"
     crossorigin="anonymous"></script>"#;

// Signatures by which previously injected snippets are recognized,
// whatever id they were injected with.
const GTM_HEAD_SIGNATURE: &str = "googletagmanager.com/gtm.js";
const GTM_BODY_SIGNATURE: &str = "googletagmanager.com/ns.html";
const ADSENSE_SIGNATURE: &str = "adsbygoogle.js";

pub fn gtm_head_snippet(gtm_id: &str) -> String {
    GTM_HEAD_TEMPLATE.replace("{GTM_ID}", gtm_id)
}

pub fn gtm_body_snippet(gtm_id: &str) -> String {
    GTM_BODY_TEMPLATE.replace("{GTM_ID}", gtm_id)
}

pub fn adsense_head_snippet(client_id: &str) -> String {
    ADSENSE_HEAD_TEMPLATE.replace("{ADSENSE_CLIENT_ID}", client_id)
}

#[derive(Debug, Default)]
pub struct InjectResult {
    pub html: String,
    pub gtm_applied: bool,
    pub adsense_applied: bool,
    pub warnings: Vec<String>,
}

/// Remove every `<script>`/`<noscript>` element whose body contains the
/// given signature. Elements are tokenized with a lazy match so unrelated
/// siblings are never swallowed.
fn remove_signed_blocks(html: &str, element: &str, signature: &str) -> String {
    let pattern = format!(r"(?is)<{element}\b[^>]*>.*?</{element}>");
    let re = Regex::new(&pattern).expect("static element pattern");

    let mut out = String::with_capacity(html.len());
    let mut last = 0usize;
    for m in re.find_iter(html) {
        if m.as_str().contains(signature) {
            out.push_str(&html[last..m.start()]);
            last = m.end();
        }
    }
    out.push_str(&html[last..]);
    out
}

fn insert_after(html: &str, open_tag: &Regex, snippet: &str) -> Option<String> {
    let m = open_tag.find(html)?;
    let mut out = String::with_capacity(html.len() + snippet.len() + 1);
    out.push_str(&html[..m.end()]);
    out.push('\n');
    out.push_str(snippet);
    out.push_str(&html[m.end()..]);
    Some(out)
}

fn insert_before(html: &str, close_tag: &Regex, snippet: &str) -> Option<String> {
    let m = close_tag.find(html)?;
    let mut out = String::with_capacity(html.len() + snippet.len() + 1);
    out.push_str(&html[..m.start()]);
    out.push_str(snippet);
    out.push('\n');
    out.push_str(&html[m.start()..]);
    Some(out)
}

/// Inject the requested snippets into one document. Existing copies are
/// removed by signature first and fresh ones reinserted at fixed positions,
/// so the result carries exactly one copy of each snippet type no matter
/// how many times this runs.
pub fn inject(html: &str, gtm_id: Option<&str>, adsense_id: Option<&str>) -> InjectResult {
    let head_open = Regex::new(r"(?i)<head\b[^>]*>").expect("static regex");
    let body_open = Regex::new(r"(?i)<body\b[^>]*>").expect("static regex");
    let head_close = Regex::new(r"(?i)</head>").expect("static regex");

    let mut result = InjectResult { html: html.to_string(), ..Default::default() };

    if let Some(id) = gtm_id {
        let stripped = remove_signed_blocks(&result.html, "script", GTM_HEAD_SIGNATURE);
        let stripped = remove_signed_blocks(&stripped, "noscript", GTM_BODY_SIGNATURE);

        let with_head = insert_after(&stripped, &head_open, &gtm_head_snippet(id));
        match with_head.and_then(|h| insert_after(&h, &body_open, &gtm_body_snippet(id))) {
            Some(updated) => {
                result.html = updated;
                result.gtm_applied = true;
            }
            None => {
                result.warnings.push("GTM skipped: no <head> or <body> tag".to_string());
            }
        }
    }

    if let Some(id) = adsense_id {
        let stripped = remove_signed_blocks(&result.html, "script", ADSENSE_SIGNATURE);
        match insert_before(&stripped, &head_close, &adsense_head_snippet(id)) {
            Some(updated) => {
                result.html = updated;
                result.adsense_applied = true;
            }
            None => {
                result.warnings.push("AdSense skipped: no </head> tag".to_string());
            }
        }
    }

    result
}

/// Walk the site tree and inject tags into every HTML file. Per-file
/// failures are logged and skipped; the run never aborts on one bad file.
pub fn run(cfg: &Config, gtm_id: Option<&str>, adsense_id: Option<&str>) -> Result<InjectSummary> {
    let base_dir = cfg.base_dir();
    anyhow::ensure!(base_dir.is_dir(), "site directory {} not found", base_dir.display());

    let mut summary = InjectSummary::default();

    for entry in WalkDir::new(&base_dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if !name.ends_with(".html") && !name.ends_with(".htm") {
            continue;
        }

        let path = entry.path();
        let html = match fs::read_to_string(path) {
            Ok(h) => h,
            Err(e) => {
                ux::fail(&format!("{}: {e}", path.display()));
                summary.errors += 1;
                continue;
            }
        };

        let result = inject(&html, gtm_id, adsense_id);
        for w in &result.warnings {
            ux::warn(&format!("{}: {w}", path.display()));
        }

        if !result.gtm_applied && !result.adsense_applied {
            summary.skipped += 1;
            continue;
        }

        if let Err(e) = fs::write(path, &result.html) {
            ux::fail(&format!("{}: {e}", path.display()));
            summary.errors += 1;
            continue;
        }

        if result.gtm_applied {
            summary.gtm_injected += 1;
        }
        if result.adsense_applied {
            summary.adsense_injected += 1;
        }
        ux::ok(&format!("tags injected: {}", path.display()));
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Test</title>
<script>console.log("app");</script>
</head>
<body class="bg-white">
<main><p>content</p></main>
</body>
</html>"#;

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn injects_all_three_snippets_once() {
        let result = inject(PAGE, Some("GTM-ABC123"), Some("ca-pub-42"));
        assert!(result.gtm_applied);
        assert!(result.adsense_applied);
        assert_eq!(count(&result.html, GTM_HEAD_SIGNATURE), 1);
        assert_eq!(count(&result.html, GTM_BODY_SIGNATURE), 1);
        assert_eq!(count(&result.html, ADSENSE_SIGNATURE), 1);
        // unrelated scripts survive
        assert!(result.html.contains(r#"console.log("app");"#));
    }

    #[test]
    fn double_injection_is_idempotent() {
        let once = inject(PAGE, Some("GTM-ABC123"), Some("ca-pub-42"));
        let twice = inject(&once.html, Some("GTM-ABC123"), Some("ca-pub-42"));
        assert_eq!(count(&twice.html, GTM_HEAD_SIGNATURE), 1);
        assert_eq!(count(&twice.html, GTM_BODY_SIGNATURE), 1);
        assert_eq!(count(&twice.html, ADSENSE_SIGNATURE), 1);
    }

    #[test]
    fn stale_ids_are_replaced() {
        let once = inject(PAGE, Some("GTM-OLD"), Some("ca-pub-old"));
        let twice = inject(&once.html, Some("GTM-NEW"), Some("ca-pub-new"));
        assert!(!twice.html.contains("GTM-OLD"));
        assert!(!twice.html.contains("ca-pub-old"));
        assert_eq!(count(&twice.html, "GTM-NEW"), 2); // head script + noscript iframe
        assert_eq!(count(&twice.html, "ca-pub-new"), 1);
    }

    #[test]
    fn gtm_positions_are_fixed() {
        let result = inject(PAGE, Some("GTM-ABC123"), None);
        let head_pos = result.html.to_lowercase().find("<head>").unwrap();
        let script_pos = result.html.find(GTM_HEAD_SIGNATURE).unwrap();
        let title_pos = result.html.find("<title>").unwrap();
        assert!(head_pos < script_pos && script_pos < title_pos);

        let body_pos = result.html.find("<body").unwrap();
        let noscript_pos = result.html.find(GTM_BODY_SIGNATURE).unwrap();
        let main_pos = result.html.find("<main>").unwrap();
        assert!(body_pos < noscript_pos && noscript_pos < main_pos);
    }

    #[test]
    fn missing_head_is_skipped_with_warning() {
        let fragment = "<p>no shell here</p>";
        let result = inject(fragment, Some("GTM-ABC123"), Some("ca-pub-42"));
        assert!(!result.gtm_applied);
        assert!(!result.adsense_applied);
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(result.html, fragment);
    }
}
