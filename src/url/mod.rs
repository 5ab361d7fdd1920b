//! URL handling module for Ripple-Crawl
//!
//! This module provides URL normalization, link resolution and the domain
//! comparison used as the crawl's admission filter.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, same_domain};
pub use normalize::{normalize_url, resolve_link};
