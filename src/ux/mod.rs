use colored::Colorize;
use std::io::{self, Write};

use crate::cli::TagIds;

pub fn banner(text: &str) {
    println!("\n{}", format!("=== {} ===", text).bold());
}

pub fn phase(text: &str) {
    println!("\n{} {}", "--".cyan().bold(), text.bold());
}

pub fn ok(text: &str) {
    println!("{} {}", "ok".green().bold(), text);
}

pub fn warn(text: &str) {
    eprintln!("{} {}", "warning".yellow().bold(), text);
}

pub fn fail(text: &str) {
    eprintln!("{} {}", "error".red().bold(), text);
}

pub fn confirm(prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    let _ = io::stdout().flush();
    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        let ans = s.trim().to_lowercase();
        ans == "y" || ans == "yes"
    } else {
        false
    }
}

pub fn prompt_line(prompt: &str) -> Option<String> {
    print!("{} (Enter to skip): ", prompt);
    let _ = io::stdout().flush();
    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_err() {
        return None;
    }
    let trimmed = s.trim().to_string();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

/// Resolve tracking ids from flags, falling back to interactive prompts.
/// Warns on ids that do not carry the expected vendor prefix but accepts
/// them anyway.
pub fn resolve_tag_ids(tags: &TagIds, interactive: bool) -> (Option<String>, Option<String>) {
    let gtm = tags.gtm_id.clone().or_else(|| {
        if interactive {
            prompt_line("Google Tag Manager ID (GTM-XXXXXXX)")
        } else {
            None
        }
    });
    let adsense = tags.adsense_id.clone().or_else(|| {
        if interactive {
            prompt_line("Google AdSense Client ID (ca-pub-...)")
        } else {
            None
        }
    });

    if let Some(id) = &gtm {
        if !id.starts_with("GTM-") {
            warn(&format!("GTM id ({id}) does not start with 'GTM-'"));
        }
    }
    if let Some(id) = &adsense {
        if !id.starts_with("ca-pub-") {
            warn(&format!("AdSense id ({id}) does not start with 'ca-pub-'"));
        }
    }

    (gtm, adsense)
}

/// End-of-run summary for a batch of page generations.
pub struct GenSummary {
    pub results: Vec<(String, Result<(), String>)>,
}

impl GenSummary {
    pub fn new() -> Self {
        Self { results: Vec::new() }
    }

    pub fn record_ok(&mut self, file_name: &str) {
        self.results.push((file_name.to_string(), Ok(())));
    }

    pub fn record_err(&mut self, file_name: &str, err: &str) {
        self.results.push((file_name.to_string(), Err(err.to_string())));
    }

    pub fn print(&self, title: &str) {
        let generated = self.results.iter().filter(|(_, r)| r.is_ok()).count();
        let failed = self.results.len() - generated;

        println!(
            "\n{}",
            format!("┏━━━━━━━━━━━━━━━ {} ━━━━━━━━━━━━━━━┓", title).bold()
        );
        println!(
            "  {}: {}   {}: {}",
            "Generated".green().bold(),
            generated,
            "Failed".red().bold(),
            failed
        );
        println!("{}", "┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛".bold());

        for (file, result) in &self.results {
            match result {
                Ok(()) => println!("  {} {}", "[OK]".green().bold(), file),
                Err(e) => println!("  {} {}: {}", "[FAIL]".red().bold(), file, e),
            }
        }
    }
}

/// Summary for a tag-injection run.
#[derive(Default)]
pub struct InjectSummary {
    pub gtm_injected: usize,
    pub adsense_injected: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl InjectSummary {
    pub fn print(&self) {
        println!(
            "\n{}",
            "┏━━━━━━━━━━━━━━━ Tag Injection ━━━━━━━━━━━┓".bold()
        );
        println!(
            "  {}: {}   {}: {}   {}: {}   {}: {}",
            "GTM".green().bold(),
            self.gtm_injected,
            "AdSense".green().bold(),
            self.adsense_injected,
            "Skipped".yellow().bold(),
            self.skipped,
            "Errors".red().bold(),
            self.errors
        );
        println!("{}", "┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛".bold());
    }
}
