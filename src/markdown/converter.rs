use crate::extract::{body, visible_text};
use crate::markdown::MarkdownOptions;
use htmd::options::{CodeBlockStyle, HeadingStyle, LinkStyle, Options};
use htmd::HtmlToMarkdown;
use regex::{Captures, Regex};
use scraper::Html;
use std::sync::OnceLock;
use url::Url;

/// Elements dropped with their content
const DROPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "head", "title", "svg", "iframe", "canvas",
    "object", "embed",
];

/// Page chrome removed when `strip_chrome` is set
const CHROME_TAGS: &[&str] = &[
    "nav", "header", "footer", "aside", "form", "button", "input", "select", "textarea",
];

/// Builds the htmd converter for a set of options
pub(crate) fn build(options: &MarkdownOptions) -> HtmlToMarkdown {
    let mut skipped: Vec<&str> = DROPPED_TAGS.to_vec();
    if options.strip_chrome {
        skipped.extend_from_slice(CHROME_TAGS);
    }
    if !options.include_images {
        skipped.push("img");
    }

    HtmlToMarkdown::builder()
        .options(Options {
            heading_style: HeadingStyle::Atx,
            code_block_style: CodeBlockStyle::Fenced,
            link_style: LinkStyle::Inlined,
            ..Default::default()
        })
        .skip_tags(skipped)
        .build()
}

/// Rewrites an HTML fragment into the form handed to htmd
///
/// 1. Re-serialize through the HTML5 parser so tags and attributes are in
///    canonical form (double-quoted, `&amp;`/`&quot;` escaped)
/// 2. Resolve `href` and `src` against the base URL; in-page and
///    `javascript:` links lose their `href` and render as text
/// 3. Without `include_tables`, turn table markup into plain blocks
pub(crate) fn prepare(html_fragment: &str, options: &MarkdownOptions) -> String {
    let fragment = Html::parse_fragment(html_fragment);
    let mut html = fragment.root_element().inner_html();

    if let Some(patterns) = patterns() {
        html = patterns
            .link_tag
            .replace_all(&html, |tag: &Captures| {
                rewrite_targets(patterns, &tag[0], options.base_url.as_ref())
            })
            .into_owned();

        if !options.include_tables {
            html = patterns
                .table_block
                .replace_all(&html, "<${1}div${2}>")
                .into_owned();
            html = patterns
                .table_cell
                .replace_all(&html, "<${1}span${2}> ")
                .into_owned();
        }
    }

    html
}

/// Tidies htmd output: trailing spaces, runs of blank lines, outer blanks
pub(crate) fn tidy(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut blank_run = 0;

    for line in markdown.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}

/// Plain-text rendering used when htmd rejects its input
pub(crate) fn fallback_text(html_fragment: &str) -> String {
    let document = Html::parse_document(html_fragment);
    body(&document)
        .map(visible_text)
        .unwrap_or_else(|| visible_text(document.root_element()))
}

struct Patterns {
    link_tag: Regex,
    target_attr: Regex,
    table_block: Regex,
    table_cell: Regex,
}

fn patterns() -> Option<&'static Patterns> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(Patterns {
                link_tag: Regex::new(r"(?i)<(?:a|img)\s[^>]*>").ok()?,
                target_attr: Regex::new(r#"(?i)\s(href|src)="([^"]*)""#).ok()?,
                table_block: Regex::new(r"(?i)<(/?)(?:table|thead|tbody|tfoot|tr|caption)\b([^>]*)>")
                    .ok()?,
                table_cell: Regex::new(r"(?i)<(/?)(?:td|th)\b([^>]*)>").ok()?,
            })
        })
        .as_ref()
}

fn rewrite_targets(patterns: &Patterns, tag: &str, base_url: Option<&Url>) -> String {
    patterns
        .target_attr
        .replace_all(tag, |attr: &Captures| {
            let name = &attr[1];
            let value = unescape_attr(&attr[2]);
            let value = value.trim();

            let lowered = value.to_ascii_lowercase();
            if name.eq_ignore_ascii_case("href")
                && (value.is_empty() || value.starts_with('#') || lowered.starts_with("javascript:"))
            {
                return String::new();
            }

            let resolved = base_url
                .and_then(|base| base.join(value).ok())
                .map(String::from)
                .unwrap_or_else(|| value.to_string());
            format!(" {}=\"{}\"", name, escape_attr(&resolved))
        })
        .into_owned()
}

fn unescape_attr(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}
