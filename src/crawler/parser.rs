//! HTML field extraction
//!
//! This module handles parsing HTML content to extract:
//! - Page title
//! - Headings (`h1`–`h3`) and paragraphs
//! - The `<meta name="description">` content
//! - Outbound links, resolved to absolute URLs

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Structured fields pulled from one page body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageFields {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Text of every h1, h2 and h3 in document order
    pub headings: Vec<String>,

    /// Text of every <p> in document order
    pub paragraphs: Vec<String>,

    /// Content of `<meta name="description">`
    pub meta_description: Option<String>,

    /// All http(s) links found on the page (absolute URLs, document order)
    pub links: Vec<String>,
}

/// Turns a response body into [`PageFields`]
pub trait Extractor: Send + Sync {
    fn extract(&self, body: &str, base_url: &Url) -> PageFields;
}

/// `scraper`-based extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl Extractor for HtmlExtractor {
    fn extract(&self, body: &str, base_url: &Url) -> PageFields {
        parse_html(body, base_url)
    }
}

/// Parses HTML content and extracts page fields
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
/// - Anything that is not HTTP(S) after resolution
///
/// Image links are *not* removed here; eligibility filtering happens when a
/// link is turned into an address.
///
/// # Example
///
/// ```
/// use burrow::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("http://example.onion/").unwrap();
/// let fields = parse_html(html, &base_url);
/// assert_eq!(fields.title, Some("Test".to_string()));
/// assert_eq!(fields.links, vec!["http://example.onion/page".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> PageFields {
    let document = Html::parse_document(html);

    PageFields {
        title: extract_title(&document),
        headings: collect_text(&document, "h1, h2, h3"),
        paragraphs: collect_text(&document, "p"),
        meta_description: extract_meta_description(&document),
        links: extract_links(&document, base_url),
    }
}

/// Whitespace-trimmed text content of an element
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

fn collect_text(document: &Html, selector: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(element_text)
        .filter(|s| !s.is_empty())
        .collect()
}

fn extract_meta_description(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[name="description"]"#).ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .find(|content| !content.is_empty())
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only hrefs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}
