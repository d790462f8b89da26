use crate::analyze::ArticleAnalysis;
use crate::inject;
use crate::plan::PagePlan;

pub fn identity(raw_input: &str) -> String {
    format!(
        r#"You are an expert in corporate identity construction.
Analyze the following "core philosophy and vision" holistically and define the
corporate persona at the heart of this organization (purpose, mission, vision).

IMPORTANT: Output ONLY the extraction in the requested Markdown format. No
commentary, no conversational responses, no explanations.

### Core philosophy and vision
{raw_input}

---

### Corporate persona framework to extract and generate

**Purpose (reason for being):** [define the most fundamental reason to exist and the contribution to society, concisely]
**Mission (current mandate and guiding action):** [define what must concretely be done now to fulfil the purpose]
**Vision (the future to aim for):** [define the concrete, inspiring future realized once the mission succeeds]
**Persona / Tone:** [define the outward personality, brand image, and communication tone this organization should carry]
"#
    )
}

pub fn sitemap_outline(identity: &str) -> String {
    format!(
        r###"You are a website UX architect.
Based on the "corporate identity" below, generate a hierarchical sitemap in
Markdown that supports the visitor's logical train of thought.

### Sitemap rules
1. Reflect the site's core message and structure.
2. The global navigation must consist of exactly five level-1 items:
   VISION, SOLUTIONS, INSIGHTS, COLLABORATION, CONTACT.
3. Design concrete level-2 page structures that reflect the organization's
   mission (data-science PDCA, individual optimization).
4. Start the output with the heading "## Sitemap: [site name]".

### Corporate identity
{identity}
"###
    )
}

pub fn content_strategy(identity: &str, sitemap: &str) -> String {
    format!(
        r#"You are a content strategist for a data-science company.
Based on the "corporate identity" and "sitemap" below, draft the content
strategy (outline) for the homepage and the key pages.

### Drafting rules
1. **Target audience:** business leaders, researchers, and future-minded
   citizens interested in the Society 5.0 transformation.
2. **Tone:** progressive, analytical, logical, trust-building.
3. **Output format:** three sections, each with concrete heading proposals
   and bullet-point outlines.

### Corporate identity
{identity}

### Confirmed sitemap structure
{sitemap}

### Content strategy (output)

--- A. Homepage strategy ---
- Hero section (first view) copy proposal (the single most important message):
- Primary navigation sections and the content summaries to place on the homepage:
- CTA (call to action) placement strategy:

--- B. VISION page strategy (establishing credibility) ---
- Page goal: present the scientific grounding behind the philosophy and claims.
- Headings and logical structure for the key content "scientific basis of web data analysis":

--- C. SOLUTIONS page strategy (proving execution) ---
- Page goal: back the abstract "individual optimization" with a concrete "PDCA method" and case studies.
- Detailed outline for "individual optimization method: the data-science PDCA cycle":
- Success factors to emphasize in "case studies":
"#
    )
}

pub fn target_page_list(identity: &str, strategy: &str) -> String {
    format!(
        r#"You are a website architect. Based on the "corporate persona" and
"content strategy" below, generate the list of ALL fixed pages (about 10)
that make up the site's global navigation, as a JSON array.

### Critical rules
1. Include every global navigation element (VISION, SOLUTIONS, INSIGHTS, COLLABORATION, CONTACT).
2. **File structure:** each main section lives in its own subdirectory with
   file name `section/index.html` (example: vision/index.html).
3. Utility pages (policies) live under the `legal/` directory
   (example: legal/privacy-policy.html).
4. `purpose` concisely describes the strategic role the page must play.

Output format:
[
  {{"title": "Home", "file_name": "index.html", "purpose": "The face of the site. Hero section plus concise overviews of VISION, SOLUTIONS and the other sections, with a strong CTA."}},
  {{"title": "Vision", "file_name": "vision/index.html", "purpose": "Present the purpose, mission, vision and the scientific basis of web data analysis logically and empirically, building trust in the philosophy."}},
  ... (complete all pages)
]

### Corporate identity
{identity}

### Content strategy highlights
{strategy}
"#
    )
}

fn tag_instructions(gtm_id: Option<&str>, adsense_id: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(id) = gtm_id {
        out.push_str(&format!(
            r#"
5.  **Google Tag Manager insertion:**
    - Insert the following code as high as possible inside the <head> tag:
    {head}
    - Insert the following code immediately after the opening <body> tag:
    {body}
"#,
            head = inject::gtm_head_snippet(id),
            body = inject::gtm_body_snippet(id),
        ));
    }
    if let Some(id) = adsense_id {
        out.push_str(&format!(
            r#"
6.  **Google AdSense insertion:**
    - Insert the following code inside the <head> tag:
    {head}
"#,
            head = inject::adsense_head_snippet(id),
        ));
    }
    out
}

pub fn page_html(
    page: &PagePlan,
    identity: &str,
    strategy: Option<&str>,
    nav_structure: &str,
    gtm_id: Option<&str>,
    adsense_id: Option<&str>,
) -> String {
    let content_instruction = if page.is_hub() {
        format!(
            "This page is a hub page (table of contents). To fulfil its purpose ({}), focus on **deep logical structure and concrete writing**.",
            page.purpose
        )
    } else {
        format!(
            "This page is a detail article. To fulfil its purpose ({}), focus on **deep logical structure and concrete data-science writing**.",
            page.purpose
        )
    };

    let mut content_focus = format!(
        "**This page's concrete goal and required content detail:** {}\n",
        page.purpose
    );
    if let Some(strategy) = strategy {
        content_focus.push_str(&format!("\n--- Overall strategy summary ---\n{strategy}"));
    }

    format!(
        r#"You are a world-class web designer and front-end engineer.
Based on the "corporate persona/tone" and "content strategy" below, generate a
**single modern, responsive HTML file for {title} ({file_name})**.

### CRITICAL INSTRUCTION: output format
- Begin the code at the marker **[START HTML CODE]**.
- **Always** write the complete HTML structure from `<!DOCTYPE html>` to `</html>`.
- **Always** finish the output with `\n```eof` (open the code block with ```html).

### CRITICAL REQUIREMENTS
1.  **Keep the design frame:** keep the design (palette, fonts, Tailwind CSS) fully consistent.
2.  **Navigation integration:** header and footer links must use the **exact file names** (example: vision/index.html).
3.  **Content role:** {content_instruction}
4.  **Tailwind CSS:** load the CDN and use Tailwind classes for all styling.
{tag_instructions}

### Page-specific input
- Page title: {title}
- Page file name: {file_name}
- Page purpose: {purpose}

### Global input
- Corporate persona framework: {identity}
- Content strategy (content focus): {content_focus}
- Confirmed page list (navigation structure):
{nav_structure}

[START HTML CODE]
"#,
        title = page.title,
        file_name = page.file_name,
        purpose = page.purpose,
        tag_instructions = tag_instructions(gtm_id, adsense_id),
    )
}

pub fn article_purpose(analysis: &ArticleAnalysis, identity: &str) -> String {
    format!(
        r#"You are the site's content strategist.
Analyze the "corporate philosophy" and the "article's current structure and
content" below, and generate in ONE sentence **the strategic purpose this
article should carry within the overall site strategy**.
IMPORTANT: reply with the generated purpose **string only**.

### Corporate identity
{identity}

### Current state of the target article
- Article title: {title}
- Heading structure: {structure}
- Body excerpt: {excerpt}

Generated purpose (one sentence):
"#,
        title = analysis.page_title,
        structure = analysis.structure,
        excerpt = analysis.excerpt,
    )
}

pub fn priority_section(
    balance_report: &str,
    identity: &str,
    pages_table: &str,
    metrics_table: &str,
) -> String {
    format!(
        r#"You are a data-driven head of content strategy. Analyze the
information below and select exactly ONE section that should receive the next
round of resources, judged by **the strategic balance of the whole site**.

### Goals and strategic weighting
1. **Balance analysis:** analyze the "strategic balance (current article counts)" report below.
2. **Selection criterion:** the VISION section is likely already well covered.
   Select the **core strategy section with the fewest articles** (for example
   SOLUTIONS or INSIGHTS), or the one with the largest gap to VISION.
3. **Exclusions:** utility pages (legal/, contact/) are not eligible.

### Site strategic balance (current article counts)
{balance_report}

### Corporate identity
{identity}

### Page list under analysis (reference: every page's purpose)
{pages_table}

### Performance data (reference: data is uniform)
{metrics_table}
---
Reply ONLY with JSON in this shape, and make the reason explain **why that
section is optimal from a strategic-balance standpoint**:
{{"file_name": "[chosen file name]", "reason": "[logical rationale for the choice]"}}
"#
    )
}

pub fn article_plan(
    section: &PagePlan,
    identity: &str,
    count: usize,
    start_number: usize,
) -> String {
    format!(
        r#"You are an SEO and data-science expert.
Based on the "corporate identity" and the "priority section's strategic
purpose" below, generate {count} **concrete, highly specialized article titles,
summaries, and SEO slugs (file names)** that contribute most to that purpose.

### CRITICAL requirements
1. **Slug format:** lowercase English, hyphen-separated, `.html` extension,
   accurately reflecting the article content.
2. **Numbering start:** number the {count} slugs sequentially starting at
   {start_number}, accounting for existing content (example:
   ...-{start_number}.html, ...-{next_number}.html, ...).
3. **JSON output:** reply with a JSON array only; include the sequence number
   in each slug.

### Priority section's strategic purpose
{title} ({file_name})
Purpose: {purpose}

### Corporate identity
{identity}
---
Reply ONLY with a JSON array in this shape:
[
  {{"title": "Article title", "summary": "Summary", "file_name": "seo-optimized-slug-{start_number}.html"}},
  ... ({count} entries)
]
"#,
        title = section.title,
        file_name = section.file_name,
        purpose = section.purpose,
        next_number = start_number + 1,
    )
}

/// Purpose override used when a hub page is regenerated to pick up links to
/// its detail articles.
pub fn hub_refresh_purpose(hub: &PagePlan, section: &str, links_html: &str, count: usize) -> String {
    format!(
        r#"This page ({title}) works as a hub page containing entry points to all
{count} detail articles below. Summarize the original purpose ({purpose})
while providing a clear table of contents linking to these articles.

[All detail articles in the {section} section]
{links_html}
"#,
        title = hub.title,
        purpose = hub.purpose,
    )
}

/// Purpose override used when hub pages are regenerated during repair with a
/// mandatory tracking-tag task.
pub fn hub_tag_purpose(original_purpose: &str, gtm_id: Option<&str>, adsense_id: Option<&str>) -> String {
    format!(
        r#"[TOP PRIORITY TASK] Insert the GTM id ({gtm}) and the AdSense client id
({adsense}) at the correct positions inside <head> and <body>.

[Content purpose]
{original_purpose}
(If this is a hub page, also generate a table of contents linking to the
articles beneath it.)
"#,
        gtm = gtm_id.unwrap_or("none"),
        adsense = adsense_id.unwrap_or("none"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sitemap_outline_keeps_the_heading_instruction() {
        let prompt = sitemap_outline("persona");
        assert!(prompt.contains(r###"Start the output with the heading "## Sitemap: [site name]"."###));
        assert!(prompt.contains("persona"));
    }

    #[test]
    fn page_html_embeds_tag_snippets_only_when_ids_are_given() {
        let page = PagePlan::new("Home", "index.html", "entry");
        let bare = page_html(&page, "persona", None, "", None, None);
        assert!(!bare.contains("googletagmanager.com"));

        let tagged = page_html(&page, "persona", None, "", Some("GTM-X"), Some("ca-pub-1"));
        assert!(tagged.contains("googletagmanager.com/gtm.js"));
        assert!(tagged.contains("adsbygoogle.js?client=ca-pub-1"));
    }
}
