use crate::extract::text::visible_text;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

/// Description text is clipped to this many characters
const DESCRIPTION_MAX_CHARS: usize = 200;

/// Paragraphs shorter than this are not used as a fallback description
const DESCRIPTION_MIN_CHARS: usize = 20;

/// Descriptive information about a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub headings: Vec<Heading>,
    pub images: Vec<ImageInfo>,
    pub tables: Vec<TableInfo>,
}

/// A heading and its level (1-6)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// An image referenced by the page, `src` as written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub src: String,
    pub alt: String,
}

/// Shape and cell text of a data table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub rows: usize,

    /// Cell count of the first row
    pub columns: usize,

    pub data: Vec<Vec<String>>,
}

/// Extracts title, description, headings, images and tables from a document
pub fn extract_metadata(document: &Html) -> PageMetadata {
    PageMetadata {
        title: extract_title(document),
        description: extract_description(document),
        headings: extract_headings(document),
        images: extract_images(document),
        tables: extract_tables(document),
    }
}

/// Page title from `<title>`, falling back to the first `<h1>`
fn extract_title(document: &Html) -> Option<String> {
    first_text(document, "title").or_else(|| first_text(document, "h1"))
}

/// Meta description, falling back to the first substantial paragraph
fn extract_description(document: &Html) -> Option<String> {
    if let Ok(selector) = Selector::parse("meta[name=description][content]") {
        let meta = document
            .select(&selector)
            .filter_map(|el| el.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty());
        if let Some(content) = meta {
            return Some(content.to_string());
        }
    }

    let selector = Selector::parse("p").ok()?;
    let paragraph = document
        .select(&selector)
        .map(visible_text)
        .find(|text| text.chars().count() > DESCRIPTION_MIN_CHARS)?;

    Some(clip(&paragraph, DESCRIPTION_MAX_CHARS))
}

fn extract_headings(document: &Html) -> Vec<Heading> {
    let Ok(selector) = Selector::parse("h1, h2, h3, h4, h5, h6") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|el| {
            let level = el.value().name()[1..].parse::<u8>().ok()?;
            let text = visible_text(el);
            (!text.is_empty()).then_some(Heading { level, text })
        })
        .collect()
}

fn extract_images(document: &Html) -> Vec<ImageInfo> {
    let Ok(selector) = Selector::parse("img[src]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|el| {
            let src = el.value().attr("src")?.trim();
            (!src.is_empty()).then(|| ImageInfo {
                src: src.to_string(),
                alt: el.value().attr("alt").unwrap_or_default().trim().to_string(),
            })
        })
        .collect()
}

/// Tables with at least one non-empty row
///
/// Rows of nested tables are counted in the nested table only.
fn extract_tables(document: &Html) -> Vec<TableInfo> {
    let (Ok(tables), Ok(cells)) = (Selector::parse("table"), Selector::parse("td, th")) else {
        return Vec::new();
    };

    document
        .select(&tables)
        .filter_map(|table| {
            let data: Vec<Vec<String>> = table
                .descendants()
                .filter_map(ElementRef::wrap)
                .filter(|el| el.value().name() == "tr" && belongs_to(*el, table))
                .map(|row| {
                    row.select(&cells)
                        .filter(|cell| belongs_to(*cell, table))
                        .map(visible_text)
                        .collect::<Vec<_>>()
                })
                .filter(|row| !row.is_empty())
                .collect();

            let columns = data.first()?.len();
            Some(TableInfo {
                rows: data.len(),
                columns,
                data,
            })
        })
        .collect()
}

/// Returns true if `table` is the nearest `<table>` enclosing `element`
fn belongs_to(element: ElementRef<'_>, table: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
        .map_or(false, |el| el.id() == table.id())
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let clipped: String = text.chars().take(max_chars).collect();
    format!("{}...", clipped)
}
