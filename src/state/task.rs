use url::Url;

/// A URL waiting on the frontier, with its distance from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub url: Url,
    pub depth: u32,
}

impl Task {
    /// The depth-0 task for the crawl's seed
    pub fn seed(url: Url) -> Self {
        Self { url, depth: 0 }
    }

    /// A task for a link discovered while processing `self`
    pub fn child(&self, url: Url) -> Self {
        Self {
            url,
            depth: self.depth + 1,
        }
    }
}
