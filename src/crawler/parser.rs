//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Page title
//! - `description` and `keywords` meta tags
//! - Same-site links to follow

use crate::url::{extract_domain, resolve_link, same_domain};
use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

/// Errors that can occur while extracting a page
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Base URL has no host: {0}")]
    MissingHost(String),

    #[error("Invalid selector '{0}'")]
    Selector(&'static str),
}

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Text of the first `<title>`, trimmed; empty when there is none
    pub title: String,

    /// Content of the first `<meta name="description">`
    pub description: String,

    /// Content of the first `<meta name="keywords">`
    pub keywords: String,

    /// Absolute links on the same domain as the page, fragments removed
    pub links: Vec<Url>,
}

/// Parses HTML content and extracts metadata and links
///
/// # Extraction Rules
///
/// - The title is the first `<title>` element in document order
/// - Meta tags match on `name` case-insensitively; the first one wins
/// - Every `<a href>` is trimmed and resolved against `base_url`
/// - Only links whose domain equals the domain of `base_url` are kept
/// - Malformed hrefs are skipped, irregular markup is tolerated
///
/// # Arguments
///
/// * `base_url` - The URL the page was fetched from
/// * `html` - The HTML content to parse
///
/// # Returns
///
/// * `Ok(ExtractedPage)` - Successfully parsed page
/// * `Err(ExtractError)` - The page cannot be attributed to a site
///
/// # Example
///
/// ```
/// use ripple_crawl::crawler::extract;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let page = extract(&base_url, html).unwrap();
/// assert_eq!(page.title, "Test");
/// assert_eq!(page.links[0].as_str(), "https://example.com/page");
/// ```
pub fn extract(base_url: &Url, html: &str) -> Result<ExtractedPage, ExtractError> {
    let domain =
        extract_domain(base_url).ok_or_else(|| ExtractError::MissingHost(base_url.to_string()))?;

    let document = Html::parse_document(html);

    Ok(ExtractedPage {
        title: extract_title(&document)?,
        description: extract_meta(&document, "description")?,
        keywords: extract_meta(&document, "keywords")?,
        links: extract_links(&document, base_url, &domain)?,
    })
}

fn selector(css: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::Selector(css))
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Result<String, ExtractError> {
    let title_selector = selector("title")?;

    Ok(document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default())
}

fn extract_meta(document: &Html, name: &str) -> Result<String, ExtractError> {
    let meta_selector = selector("meta[name]")?;

    Ok(document
        .select(&meta_selector)
        .find(|element| {
            element
                .value()
                .attr("name")
                .is_some_and(|n| n.trim().eq_ignore_ascii_case(name))
        })
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default())
}

/// Extracts every same-domain link from the HTML document
fn extract_links(document: &Html, base_url: &Url, domain: &str) -> Result<Vec<Url>, ExtractError> {
    let a_selector = selector("a[href]")?;

    Ok(document
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .filter(|link| same_domain(link, domain))
        .collect())
}
