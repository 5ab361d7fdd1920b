use crate::config::types::{
    default_user_agent, CrawlConfig, RawCrawlConfig, DEFAULT_DATABASE_PATH,
    DEFAULT_FRONTIER_CAPACITY, DEFAULT_MAX_DEPTH, DEFAULT_PROGRESS_INTERVAL,
    DEFAULT_REQUEST_DELAY, DEFAULT_REQUEST_TIMEOUT, DEFAULT_WORKER_COUNT,
};
use crate::config::validation::{
    parse_capacity, parse_delay, parse_depth, parse_positive_duration, parse_worker_count,
};
use crate::url::normalize_url;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;
use url::Url;

/// Loads loosely-typed configuration values from a TOML file
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(RawCrawlConfig)` - The values found in the file
/// * `Err(ConfigError)` - The file could not be read or is not TOML
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use ripple_crawl::config::{load_raw_config, CrawlConfig};
///
/// let raw = load_raw_config(Path::new("crawl.toml")).unwrap();
/// let config = CrawlConfig::from_raw(raw).unwrap();
/// println!("Max depth: {}", config.max_depth);
/// ```
pub fn load_raw_config(path: &Path) -> Result<RawCrawlConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let raw: RawCrawlConfig = toml::from_str(&content)?;
    Ok(raw)
}

impl CrawlConfig {
    /// Resolves a loosely-typed configuration
    ///
    /// Only the seed URL can make this fail. Every other field falls back to
    /// its default when missing or unparseable.
    pub fn from_raw(raw: RawCrawlConfig) -> Result<Self, ConfigError> {
        let seed_url = resolve_seed(raw.seed_url.as_deref())?;

        Ok(Self {
            seed_url,
            max_depth: parse_depth(raw.depth.as_deref(), DEFAULT_MAX_DEPTH),
            worker_count: parse_worker_count(raw.workers.as_deref(), DEFAULT_WORKER_COUNT),
            request_delay: parse_delay(raw.delay.as_deref(), DEFAULT_REQUEST_DELAY),
            frontier_capacity: parse_capacity(
                raw.queue_capacity.as_deref(),
                DEFAULT_FRONTIER_CAPACITY,
            ),
            request_timeout: parse_positive_duration(
                raw.timeout.as_deref(),
                "timeout",
                DEFAULT_REQUEST_TIMEOUT,
            ),
            progress_interval: parse_positive_duration(
                raw.progress_interval.as_deref(),
                "progress-interval",
                DEFAULT_PROGRESS_INTERVAL,
            ),
            database_path: raw
                .database_path
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            user_agent: raw
                .user_agent
                .filter(|ua| !ua.trim().is_empty())
                .unwrap_or_else(default_user_agent),
        })
    }
}

fn resolve_seed(raw: Option<&str>) -> Result<Url, ConfigError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ConfigError::MissingSeed)?;

    // Same form as discovered links, so the seed and a link back to it share a visited key
    normalize_url(raw).map_err(|e| ConfigError::InvalidSeed(format!("{}: {}", raw, e)))
}

/// Computes a SHA-256 fingerprint of the effective configuration
///
/// Stored with each run record so runs can be compared later. Only fields
/// that change what gets crawled take part.
pub fn compute_config_hash(config: &CrawlConfig) -> String {
    let canonical = format!(
        "seed={}\nmax_depth={}\nworkers={}\ndelay_ms={}",
        config.seed_url,
        config.max_depth,
        config.worker_count,
        config.request_delay.as_millis()
    );
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}
