//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use ripple_crawl::config::{CrawlConfig, RawCrawlConfig};
use ripple_crawl::crawler::{Coordinator, CrawlSummary};
use ripple_crawl::storage::{RunStatus, SqliteStorage, Storage};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds an HTML page with a title and the given links
fn page(title: &str, links: &[&str]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();

    ResponseTemplate::new(200)
        .set_body_string(format!(
            r#"<html><head><title>{}</title></head><body>{}</body></html>"#,
            title, anchors
        ))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, title: &str, links: &[&str]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(page(title, links))
        .mount(server)
        .await;
}

/// Creates a test configuration seeded at the root of the mock server
fn create_test_config(server: &MockServer, db_path: &Path, max_depth: u32) -> CrawlConfig {
    let seed = Url::parse(&format!("{}/", server.uri())).expect("Failed to parse seed URL");
    let mut config = CrawlConfig::with_seed(seed);
    config.max_depth = max_depth;
    config.worker_count = 4;
    config.request_timeout = Duration::from_secs(5);
    config.progress_interval = Duration::from_millis(200);
    config.database_path = db_path.to_string_lossy().to_string();
    config
}

async fn crawl(config: CrawlConfig) -> CrawlSummary {
    Coordinator::new(config)
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Crawl failed")
}

fn result_paths(db_path: &Path) -> BTreeSet<String> {
    let storage = SqliteStorage::new(db_path).expect("Failed to open storage");
    storage
        .export_all()
        .expect("Failed to export results")
        .into_iter()
        .map(|r| Url::parse(&r.url).expect("Result URL should parse").path().to_string())
        .collect()
}

fn paths(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_crawl_with_depth_limit() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", "Home", &["/a", "/b"]).await;
    mount_page(&mock_server, "/a", "A", &["/c"]).await;
    mount_page(&mock_server, "/b", "B", &[]).await;

    // Depth 2 is beyond the limit and must never be fetched
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(page("C", &[]))
        .expect(0)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");

    let summary = crawl(create_test_config(&mock_server, &db_path, 1)).await;

    assert!(!summary.interrupted);
    assert_eq!(summary.stats.crawled, 3);
    assert!(summary.stats.filtered >= 1);
    assert_eq!(summary.stats.in_progress, 0);
    assert_eq!(summary.stats.errors, 0);
    assert_eq!(result_paths(&db_path), paths(&["/", "/a", "/b"]));
}

#[tokio::test]
async fn test_results_have_integrity() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", "Home", &["/a"]).await;
    mount_page(&mock_server, "/a", "A", &[]).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");

    crawl(create_test_config(&mock_server, &db_path, 2)).await;

    let storage = SqliteStorage::new(&db_path).unwrap();
    let results = storage.export_all().unwrap();
    assert_eq!(results.len(), 2);

    for result in &results {
        assert!(!result.url.is_empty());
        assert_eq!(result.status, "200 OK");
        assert!(
            chrono::DateTime::parse_from_rfc3339(&result.timestamp).is_ok(),
            "timestamp {} is not ISO-8601",
            result.timestamp
        );
        assert!(storage.is_visited(&result.url).unwrap());
    }

    let home = storage
        .get_result(&format!("{}/", mock_server.uri()))
        .unwrap()
        .expect("Home page should be saved");
    assert_eq!(home.title, "Home");
}

#[tokio::test]
async fn test_second_run_skips_visited_pages() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", "Home", &["/a"]).await;
    mount_page(&mock_server, "/a", "A", &[]).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");

    let first = crawl(create_test_config(&mock_server, &db_path, 2)).await;
    assert_eq!(first.stats.crawled, 2);

    let second = crawl(create_test_config(&mock_server, &db_path, 2)).await;
    assert_eq!(second.stats.crawled, 0);
    assert!(second.stats.duplicates >= 1);
    assert_ne!(first.run_id, second.run_id);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_results().unwrap(), 2);
}

#[tokio::test]
async fn test_shared_child_fetched_once() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", "Home", &["/a", "/b", "/shared"]).await;
    mount_page(&mock_server, "/a", "A", &["/shared", "/"]).await;
    mount_page(&mock_server, "/b", "B", &["/shared", "/a"]).await;

    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(page("Shared", &["/", "/a", "/b"]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");

    let mut config = create_test_config(&mock_server, &db_path, 3);
    config.worker_count = 8;
    let summary = crawl(config).await;

    assert_eq!(summary.stats.crawled, 4);
    assert!(summary.stats.duplicates >= 1);
    assert_eq!(result_paths(&db_path), paths(&["/", "/a", "/b", "/shared"]));
}

#[tokio::test]
async fn test_http_errors_are_counted() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", "Home", &["/missing", "/broken"]).await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");

    let summary = crawl(create_test_config(&mock_server, &db_path, 2)).await;

    assert_eq!(summary.stats.crawled, 1);
    assert_eq!(summary.stats.errors, 2);
    assert_eq!(result_paths(&db_path), paths(&["/"]));

    // Failed pages are not marked visited, so a later run may retry them
    let storage = SqliteStorage::new(&db_path).unwrap();
    assert!(!storage
        .is_visited(&format!("{}/missing", mock_server.uri()))
        .unwrap());
}

#[tokio::test]
async fn test_other_hosts_not_followed() {
    let mock_server = MockServer::start().await;
    let other_server = MockServer::start().await;

    let foreign = format!("{}/foreign", other_server.uri());
    mount_page(&mock_server, "/", "Home", &[foreign.as_str(), "/local"]).await;
    mount_page(&mock_server, "/local", "Local", &[]).await;

    Mock::given(method("GET"))
        .respond_with(page("Foreign", &[]))
        .expect(0)
        .mount(&other_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");

    let summary = crawl(create_test_config(&mock_server, &db_path, 2)).await;

    assert_eq!(summary.stats.crawled, 2);
    assert_eq!(result_paths(&db_path), paths(&["/", "/local"]));
}

#[tokio::test]
async fn test_wide_site_each_page_fetched_once() {
    let mock_server = MockServer::start().await;

    let children: Vec<String> = (0..30).map(|i| format!("/p{}", i)).collect();
    let child_refs: Vec<&str> = children.iter().map(String::as_str).collect();
    mount_page(&mock_server, "/", "Home", &child_refs).await;

    for child in &children {
        // Every child links to all siblings, so each is discovered many times
        Mock::given(method("GET"))
            .and(path(child.as_str()))
            .respond_with(page(child, &child_refs))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");

    let mut config = create_test_config(&mock_server, &db_path, 2);
    config.worker_count = 8;
    config.frontier_capacity = 2000;
    let summary = crawl(config).await;

    assert_eq!(summary.stats.crawled, 31);
    assert_eq!(summary.stats.in_progress, 0);
    assert_eq!(result_paths(&db_path).len(), 31);
}

#[tokio::test]
async fn test_clean_run_leaves_no_snapshot() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", "Home", &["/a", "/b"]).await;
    mount_page(&mock_server, "/a", "A", &["/b"]).await;
    mount_page(&mock_server, "/b", "B", &[]).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");

    let summary = crawl(create_test_config(&mock_server, &db_path, 2)).await;

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert!(storage.load_snapshot().unwrap().is_empty());

    let run = storage.get_run(summary.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn test_interrupted_crawl_resumes() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", "Home", &["/a", "/b", "/c"]).await;

    for route in ["/a", "/b", "/c"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(page(route, &[]).set_delay(Duration::from_millis(400)))
            .mount(&mock_server)
            .await;
    }

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");

    let mut config = create_test_config(&mock_server, &db_path, 1);
    config.worker_count = 1;

    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    let first = coordinator
        .run_until(tokio::time::sleep(Duration::from_millis(200)))
        .await
        .unwrap();

    assert!(first.interrupted);
    assert!(first.stats.crawled < 4);

    {
        let storage = SqliteStorage::new(&db_path).unwrap();
        assert!(!storage.load_snapshot().unwrap().is_empty());
        assert_eq!(
            storage.get_run(first.run_id).unwrap().status,
            RunStatus::Interrupted
        );
    }

    let second = crawl(config).await;
    assert!(!second.interrupted);
    assert_eq!(first.stats.crawled + second.stats.crawled, 4);
    assert_eq!(result_paths(&db_path), paths(&["/", "/a", "/b", "/c"]));
}

#[tokio::test]
async fn test_invalid_depth_behaves_like_default() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", "Home", &["/a"]).await;
    mount_page(&mock_server, "/a", "A", &["/b"]).await;
    mount_page(&mock_server, "/b", "B", &["/c"]).await;

    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(page("C", &[]))
        .expect(0)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");

    let raw = RawCrawlConfig {
        seed_url: Some(format!("{}/", mock_server.uri())),
        depth: Some("not-a-number".to_string()),
        database_path: Some(db_path.to_string_lossy().to_string()),
        ..RawCrawlConfig::default()
    };
    let config = CrawlConfig::from_raw(raw).unwrap();
    assert_eq!(config.max_depth, 2);

    let summary = crawl(config).await;
    assert_eq!(summary.stats.crawled, 3);
    assert_eq!(result_paths(&db_path), paths(&["/", "/a", "/b"]));
}

#[tokio::test]
async fn test_seed_fragment_fetched_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(page("Home", &["/", "/#top"]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");

    let raw = RawCrawlConfig {
        seed_url: Some(format!("{}/#top", mock_server.uri())),
        database_path: Some(db_path.to_string_lossy().to_string()),
        ..RawCrawlConfig::default()
    };
    let summary = crawl(CrawlConfig::from_raw(raw).unwrap()).await;

    assert_eq!(summary.stats.crawled, 1);
    let storage = SqliteStorage::new(&db_path).unwrap();
    let urls: Vec<String> = storage
        .export_all()
        .unwrap()
        .into_iter()
        .map(|r| r.url)
        .collect();
    assert_eq!(urls, vec![format!("{}/", mock_server.uri())]);
}

#[tokio::test]
async fn test_single_worker_outgrows_small_frontier() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", "Home", &["/a", "/b", "/c", "/d", "/e"]).await;
    for route in ["/a", "/b", "/c", "/d", "/e"] {
        mount_page(&mock_server, route, route, &["/", "/a", "/e"]).await;
    }

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");

    let mut config = create_test_config(&mock_server, &db_path, 2);
    config.worker_count = 1;
    config.frontier_capacity = 2;

    let summary = tokio::time::timeout(Duration::from_secs(10), crawl(config))
        .await
        .expect("crawl with a full frontier should still terminate");

    assert!(!summary.interrupted);
    assert_eq!(summary.stats.crawled, 6);
    assert_eq!(summary.stats.in_progress, 0);
    assert_eq!(
        result_paths(&db_path),
        paths(&["/", "/a", "/b", "/c", "/d", "/e"])
    );

    let mut storage = SqliteStorage::new(&db_path).unwrap();
    assert!(storage.load_snapshot().unwrap().is_empty());
    assert!(storage.take_spilled(100).unwrap().is_empty());
}

#[tokio::test]
async fn test_request_delay_paces_a_worker() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", "Home", &["/a", "/b"]).await;
    mount_page(&mock_server, "/a", "A", &[]).await;
    mount_page(&mock_server, "/b", "B", &[]).await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");

    let delay = Duration::from_millis(200);
    let mut config = create_test_config(&mock_server, &db_path, 1);
    config.worker_count = 1;
    config.request_delay = delay;

    let started = std::time::Instant::now();
    let summary = crawl(config).await;
    let elapsed = started.elapsed();

    assert_eq!(summary.stats.crawled, 3);
    assert!(
        elapsed >= delay * 2,
        "three pages on one worker took only {:?}",
        elapsed
    );
}
