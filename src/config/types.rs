use serde::{Deserialize, Deserializer};
use std::time::Duration;
use url::Url;

/// Default maximum crawl depth
pub const DEFAULT_MAX_DEPTH: u32 = 2;

/// Default number of concurrent workers
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Default per-worker politeness delay
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::ZERO;

/// Default frontier capacity
pub const DEFAULT_FRONTIER_CAPACITY: usize = 1000;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default interval between progress lines
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(3);

/// Default SQLite database location
pub const DEFAULT_DATABASE_PATH: &str = "crawler.db";

/// Loosely-typed crawl configuration as it arrives from the outside world
///
/// Every field is an optional string so that flags, environment values and
/// TOML entries (strings or integers) can all be collected before any
/// interpretation happens.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCrawlConfig {
    #[serde(rename = "seed-url", default, deserialize_with = "loose_string")]
    pub seed_url: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub depth: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub workers: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub delay: Option<String>,

    #[serde(rename = "queue-capacity", default, deserialize_with = "loose_string")]
    pub queue_capacity: Option<String>,

    #[serde(default, deserialize_with = "loose_string")]
    pub timeout: Option<String>,

    #[serde(
        rename = "progress-interval",
        default,
        deserialize_with = "loose_string"
    )]
    pub progress_interval: Option<String>,

    #[serde(rename = "database-path", default, deserialize_with = "loose_string")]
    pub database_path: Option<String>,

    #[serde(rename = "user-agent", default, deserialize_with = "loose_string")]
    pub user_agent: Option<String>,
}

impl RawCrawlConfig {
    /// Overlays `other` on top of `self`; fields set in `other` win
    pub fn merge(self, other: RawCrawlConfig) -> RawCrawlConfig {
        RawCrawlConfig {
            seed_url: other.seed_url.or(self.seed_url),
            depth: other.depth.or(self.depth),
            workers: other.workers.or(self.workers),
            delay: other.delay.or(self.delay),
            queue_capacity: other.queue_capacity.or(self.queue_capacity),
            timeout: other.timeout.or(self.timeout),
            progress_interval: other.progress_interval.or(self.progress_interval),
            database_path: other.database_path.or(self.database_path),
            user_agent: other.user_agent.or(self.user_agent),
        }
    }
}

/// Accepts any scalar TOML value and keeps its textual form
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<toml::Value>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        toml::Value::String(s) => s,
        other => other.to_string(),
    }))
}

/// Immutable, fully-resolved crawl configuration
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Where the crawl starts (depth 0)
    pub seed_url: Url,

    /// Tasks deeper than this are filtered, never fetched
    pub max_depth: u32,

    /// Number of concurrent workers (always >= 1)
    pub worker_count: usize,

    /// Pause each worker takes after finishing a task
    pub request_delay: Duration,

    /// Frontier capacity; enqueue blocks when it is reached
    pub frontier_capacity: usize,

    /// Upper bound on a single fetch
    pub request_timeout: Duration,

    /// Interval between progress lines
    pub progress_interval: Duration,

    /// Path to the SQLite database file
    pub database_path: String,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl CrawlConfig {
    /// Creates a configuration for `seed_url` with every other field defaulted
    pub fn with_seed(seed_url: Url) -> Self {
        Self {
            seed_url,
            max_depth: DEFAULT_MAX_DEPTH,
            worker_count: DEFAULT_WORKER_COUNT,
            request_delay: DEFAULT_REQUEST_DELAY,
            frontier_capacity: DEFAULT_FRONTIER_CAPACITY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            user_agent: default_user_agent(),
        }
    }
}

pub(crate) fn default_user_agent() -> String {
    format!("ripple-crawl/{}", env!("CARGO_PKG_VERSION"))
}
