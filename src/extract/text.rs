use scraper::{ElementRef, Node};

/// Elements whose text never reaches the rendered page
const HIDDEN_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "head", "title", "svg", "iframe",
];

/// Collects the human-visible text below an element
///
/// Text of script, style and similar elements is skipped. Element
/// boundaries count as word breaks and whitespace runs are collapsed.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    collapse_whitespace(&raw)
}

/// Character count of [`visible_text`]
pub fn visible_text_len(element: ElementRef<'_>) -> usize {
    visible_text(element).chars().count()
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                if HIDDEN_TAGS.contains(&el.name()) {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    out.push(' ');
                    collect_text(child_el, out);
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// Collapses runs of whitespace into single spaces and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
