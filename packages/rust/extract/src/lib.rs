//! Best-effort plain-text extraction from arbitrary third-party HTML.
//!
//! Heterogeneous, uncontrolled site markup makes any single fixed selector
//! unreliable, so extraction runs a selector-priority cascade: an ordered
//! list of known content-container selectors tried in sequence, first match
//! wins, no scoring. Boilerplate elements (navigation, scripts, ads,
//! comment sections) never contribute text, whether they wrap the match or
//! sit inside it.
//!
//! Callers must treat an empty return value as "extraction failed", not as
//! valid empty content.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Content-container selectors in priority order. First selector with a
/// usable match wins; the whole stripped document is the fallback.
const CONTENT_SELECTORS: [&str; 6] = [
    "article",
    ".article-content",
    ".post-content",
    ".entry-content",
    "main",
    ".content",
];

/// Element names whose subtrees never contribute text.
const STRIPPED_TAGS: [&str; 6] = ["script", "style", "nav", "header", "footer", "aside"];

/// Class names marking boilerplate containers (ads, comment sections).
const STRIPPED_CLASSES: [&str; 3] = ["ad", "advertisement", "comments"];

static CASCADE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CONTENT_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("static selector is valid"))
        .collect()
});

static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("static selector is valid"));

/// Extract readable text from raw HTML, trimmed and truncated to
/// `max_chars` characters.
///
/// Never panics on malformed input: the parser is lenient, and an
/// unrecoverable document simply yields an empty string.
pub fn extract_text(html: &str, max_chars: usize) -> String {
    let doc = Html::parse_document(html);

    for (selector, raw) in CASCADE.iter().zip(CONTENT_SELECTORS) {
        let Some(el) = doc
            .select(selector)
            .find(|el| !has_stripped_ancestor(*el))
        else {
            continue;
        };

        let text = element_text(el);
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            debug!(selector = raw, len = trimmed.len(), "content container matched");
            return truncate_chars(trimmed, max_chars).to_string();
        }
        // Matched but empty: fall through to the whole-document fallback.
        break;
    }

    let fallback = doc
        .select(&BODY)
        .next()
        .map(element_text)
        .unwrap_or_default();
    truncate_chars(fallback.trim(), max_chars).to_string()
}

/// Collect the text of an element, skipping stripped subtrees.
pub fn element_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(el, &mut out);
    out
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            scraper::Node::Text(text) => out.push_str(text),
            scraper::Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if !is_stripped(child_el) {
                        collect_text(child_el, out);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Whether this element belongs to the strip set (boilerplate chrome).
fn is_stripped(el: ElementRef<'_>) -> bool {
    let name = el.value().name();
    if STRIPPED_TAGS.contains(&name) {
        return true;
    }
    el.value()
        .classes()
        .any(|class| STRIPPED_CLASSES.contains(&class))
}

/// Whether any ancestor of this element is stripped. A content container
/// nested inside chrome does not count as a cascade match.
fn has_stripped_ancestor(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(is_stripped)
}

/// Truncate to at most `max_chars` characters, never splitting a
/// multibyte character.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
