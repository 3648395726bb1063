//! Markup and JSON helpers shared by the extraction strategies

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static LABEL_CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, dt, td, li, span, b, strong").unwrap());
static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

/// Separators found between a page title and the site name
const TITLE_SEPARATORS: &[char] = &['|', '｜', '-', '–', '—', ':', '：', '/', '·', '»'];

/// Label terminators in `Label: value` cells
const LABEL_TERMINATORS: &[char] = &[':', '：'];

/// Strips tags, decodes entities and collapses whitespace
pub fn clean_text(raw: &str) -> String {
    let without_tags = TAG_RE.replace_all(raw, " ");
    let decoded = html_escape::decode_html_entities(&without_tags);
    SPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

/// Collapsed text content of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    let text: String = element.text().collect();
    SPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Builds the selector matching `<meta>` tags for a property or name
pub fn meta_selector(name: &str) -> String {
    format!(
        "meta[property=\"{0}\"], meta[name=\"{0}\"], meta[itemprop=\"{0}\"]",
        name
    )
}

/// `content` attribute of the first matching `<meta>` tag
pub fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|e| e.value().attr("content"))
        .map(clean_text)
        .find(|s| !s.is_empty())
}

/// The `<title>` text with known site names removed from either end
pub fn page_title(document: &Html, site_names: &[String]) -> Option<String> {
    let raw = document.select(&TITLE_SELECTOR).next().map(element_text)?;
    Some(strip_site_names(&raw, site_names))
}

/// Removes known site names, and the separators next to them, from either
/// end of a title
///
/// A title that is nothing but site names comes back unchanged so that
/// validation can reject it.
pub fn strip_site_names(raw: &str, site_names: &[String]) -> String {
    let mut title = raw.trim();

    // Names can be stacked ("Item | Shop | Network"), so strip until stable
    loop {
        let before = title;
        for name in site_names.iter().filter(|n| !n.trim().is_empty()) {
            let name = name.trim();
            if let Some(rest) = strip_suffix_ignore_case(title, name) {
                title = rest.trim_end_matches(|c: char| c.is_whitespace() || TITLE_SEPARATORS.contains(&c));
            }
            if let Some(rest) = strip_prefix_ignore_case(title, name) {
                title = rest.trim_start_matches(|c: char| c.is_whitespace() || TITLE_SEPARATORS.contains(&c));
            }
        }
        if title == before {
            break;
        }
    }

    let title = title.trim();
    if title.is_empty() {
        raw.trim().to_string()
    } else {
        title.to_string()
    }
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let cut = s.len().checked_sub(suffix.len())?;
    if !s.is_char_boundary(cut) || !s[cut..].eq_ignore_ascii_case(suffix) {
        return None;
    }
    Some(&s[..cut])
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() < prefix.len()
        || !s.is_char_boundary(prefix.len())
        || !s[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        return None;
    }
    Some(&s[prefix.len()..])
}

/// Value found next to a label in a definition table or list
pub struct LabelValue<'a> {
    /// The value element, when the value sits in its own cell
    pub element: Option<ElementRef<'a>>,
    /// Collapsed value text
    pub text: String,
}

impl LabelValue<'_> {
    /// Texts of links inside the value cell
    pub fn link_texts(&self) -> Vec<String> {
        self.element
            .map(|e| {
                e.select(&LINK_SELECTOR)
                    .map(element_text)
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Finds the value associated with a label
///
/// Matches a cell whose text equals the label (ignoring a trailing colon) and
/// returns the next sibling element, or the text following `Label:` when the
/// label and value share a cell.
pub fn label_value<'a>(document: &'a Html, label: &str) -> Option<LabelValue<'a>> {
    let label = label.trim();

    for cell in document.select(&LABEL_CELL_SELECTOR) {
        let text = element_text(cell);
        let head = text.trim_end_matches(|c: char| c.is_whitespace() || LABEL_TERMINATORS.contains(&c));

        if head.eq_ignore_ascii_case(label) {
            if let Some(sibling) = cell.next_siblings().find_map(ElementRef::wrap) {
                let value = element_text(sibling);
                if !value.is_empty() {
                    return Some(LabelValue {
                        element: Some(sibling),
                        text: value,
                    });
                }
            }

            // <li><b>Label:</b> value</li>
            if let Some(parent) = cell.parent().and_then(ElementRef::wrap) {
                let parent_text = element_text(parent);
                if let Some(rest) = after_label(&parent_text, label) {
                    return Some(LabelValue {
                        element: Some(parent),
                        text: rest,
                    });
                }
            }
            continue;
        }

        if let Some(rest) = after_label(&text, label) {
            return Some(LabelValue {
                element: None,
                text: rest,
            });
        }
    }

    None
}

fn after_label(text: &str, label: &str) -> Option<String> {
    let rest = strip_prefix_ignore_case(text, label)?.trim_start();
    let rest = rest.strip_prefix(LABEL_TERMINATORS)?.trim();
    (!rest.is_empty()).then(|| rest.to_string())
}

/// Resolves a possibly relative link against the page URL
///
/// Returns None for empty links and non-HTTP schemes.
pub fn resolve_url(base_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("data:")
        || href.starts_with("mailto:")
    {
        return None;
    }

    let resolved = match Url::parse(href) {
        Ok(url) => url,
        Err(_) => Url::parse(base_url).ok()?.join(href).ok()?,
    };

    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// Extracts a value from nested JSON using a dot-notation path
pub fn extract_path<'a>(data: &'a serde_json::Value, path: &str) -> &'a serde_json::Value {
    if path.is_empty() {
        return data;
    }

    let mut current = data;
    for key in path.split('.') {
        current = match current {
            serde_json::Value::Object(map) => map.get(key).unwrap_or(&serde_json::Value::Null),
            serde_json::Value::Array(arr) => match key.parse::<usize>() {
                Ok(idx) => arr.get(idx).unwrap_or(&serde_json::Value::Null),
                Err(_) => &serde_json::Value::Null,
            },
            _ => &serde_json::Value::Null,
        };
    }

    current
}

/// Renders a scalar JSON value as text
pub fn json_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(clean_text(s)).filter(|s| !s.is_empty()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
