use crate::extract::text::{visible_text, visible_text_len};
use scraper::{ElementRef, Html, Selector};

/// Selectors tried, in order, for the principal content region
const MAIN_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role=main]",
    ".content",
    ".main-content",
    ".post-content",
    ".entry-content",
    ".article-content",
    ".page-content",
    "#content",
    "#main",
    "#article",
    "#post",
    "#entry",
];

/// Where the content fragment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    /// Matched one of the main-content selectors
    Selector(&'static str),
    /// Fell back to `<body>`
    Body,
    /// No body element; the whole document
    Document,
}

/// Principal content of a page as an HTML fragment
#[derive(Debug, Clone)]
pub struct ContentRegion {
    pub html: String,

    /// Visible text of the region, whitespace collapsed
    pub text: String,

    pub source: RegionSource,
}

impl ContentRegion {
    fn from_element(element: ElementRef<'_>, source: RegionSource) -> Self {
        Self {
            html: element.html(),
            text: visible_text(element),
            source,
        }
    }
}

/// Locates the principal content region of a document
///
/// Each selector in [`MAIN_SELECTORS`] is tried in turn; among its matches
/// the one with the most visible text wins, provided it has at least
/// `min_chars` characters. Otherwise the full body is returned.
pub fn main_content(document: &Html, min_chars: usize) -> ContentRegion {
    for &selector_str in MAIN_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };

        let best = document
            .select(&selector)
            .map(|el| (visible_text_len(el), el))
            .max_by_key(|(len, _)| *len);

        if let Some((len, element)) = best {
            if len >= min_chars {
                tracing::debug!(selector = selector_str, chars = len, "Main content region found");
                return ContentRegion::from_element(element, RegionSource::Selector(selector_str));
            }
        }
    }

    match body(document) {
        Some(body) => ContentRegion::from_element(body, RegionSource::Body),
        None => ContentRegion::from_element(document.root_element(), RegionSource::Document),
    }
}

/// Returns the `<body>` element, if the parser produced one
pub fn body(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("body").ok()?;
    document.select(&selector).next()
}
