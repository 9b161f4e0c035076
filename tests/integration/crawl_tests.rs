//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drive the real
//! HTTP fetcher, HTML extractor and SQLite store through full crawl runs.

use burrow::config::{
    parse_config, Config, CrawlerConfig, NetworkConfig, OutputConfig, PolitenessConfig,
};
use burrow::crawler::Coordinator;
use burrow::storage::{RunStatus, SqliteStorage, Storage};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with no politeness delay
fn create_test_config(seeds: Vec<String>, max_depth: u32, db_path: &str) -> Config {
    Config {
        seeds,
        crawler: CrawlerConfig {
            max_depth,
            workers: 2,
            ..CrawlerConfig::default()
        },
        politeness: PolitenessConfig {
            base_delay_ms: 0,
            jitter_ms: 0,
        },
        network: NetworkConfig {
            proxy: None,
            user_agent: "BurrowTest/1.0".to_string(),
            timeout_secs: 1,
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
    }
}

fn open_store(dir: &TempDir) -> (Arc<SqliteStorage>, String) {
    let db_path = dir.path().join("test.db");
    let storage = SqliteStorage::new(&db_path).expect("Failed to open database");
    (Arc::new(storage), db_path.to_string_lossy().into_owned())
}

/// An HTML page linking to each of `links`
fn page(title: &str, links: &[&str]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">{}</a>"#, l, l))
        .collect();

    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>{}</title></head><body><h1>{}</h1><p>Body</p>{}</body></html>",
            title, title, anchors
        ))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, at: &str, title: &str, links: &[&str]) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(page(title, links))
        .mount(server)
        .await;
}

/// Paths the server was asked for, in arrival order
async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn test_image_links_never_visited() {
    let server = MockServer::start().await;
    let root = format!("{}/", server.uri());

    mount_page(&server, "/", "Root", &["/A.png", "/B", "/C"]).await;
    mount_page(&server, "/B", "B", &[]).await;
    mount_page(&server, "/C", "C", &[]).await;

    let dir = TempDir::new().unwrap();
    let (storage, db_path) = open_store(&dir);
    let config = create_test_config(vec![root.clone()], 1, &db_path);

    let summary = Coordinator::from_config(&config, storage.clone())
        .run(&config.seeds)
        .await
        .expect("Crawl failed");

    assert_eq!(summary.persisted, 3);
    assert_eq!(summary.visited, 3);
    assert_eq!(storage.count_all().unwrap(), 3);

    let paths = requested_paths(&server).await;
    assert!(!paths.contains(&"/A.png".to_string()));

    let b = storage
        .get_page_by_url(&format!("{}/B", server.uri()))
        .unwrap()
        .expect("B should be stored");
    assert_eq!(b.depth, 1);
    assert_eq!(b.parent_url.as_deref(), Some(root.as_str()));
    assert_eq!(b.title.as_deref(), Some("B"));

    let root_page = storage.get_page_by_url(&root).unwrap().unwrap();
    assert_eq!(root_page.links_count, 2);
    assert_eq!(root_page.headings, vec!["Root"]);
}

#[tokio::test]
async fn test_max_depth_zero_stores_only_seed() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Root", &["/a", "/b"]).await;
    mount_page(&server, "/a", "A", &[]).await;

    let dir = TempDir::new().unwrap();
    let (storage, db_path) = open_store(&dir);
    let config = create_test_config(vec![format!("{}/", server.uri())], 0, &db_path);

    let summary = Coordinator::from_config(&config, storage.clone())
        .run(&config.seeds)
        .await
        .unwrap();

    assert_eq!(summary.persisted, 1);
    assert_eq!(requested_paths(&server).await, vec!["/"]);
    assert_eq!(storage.list_pages_at_depth(1).unwrap().len(), 0);
}

#[tokio::test]
async fn test_fan_out_limited_to_first_links() {
    let server = MockServer::start().await;
    let links = ["/1", "/2", "/3", "/4", "/5", "/6", "/7", "/8"];
    mount_page(&server, "/", "Root", &links).await;
    for link in links {
        mount_page(&server, link, link, &[]).await;
    }

    let dir = TempDir::new().unwrap();
    let (storage, db_path) = open_store(&dir);
    let config = create_test_config(vec![format!("{}/", server.uri())], 1, &db_path);

    let summary = Coordinator::from_config(&config, storage.clone())
        .run(&config.seeds)
        .await
        .unwrap();

    assert_eq!(summary.persisted, 6);
    assert_eq!(storage.list_pages_at_depth(1).unwrap().len(), 5);

    let paths = requested_paths(&server).await;
    assert_eq!(paths, vec!["/", "/1", "/2", "/3", "/4", "/5"]);

    // All eight links are still recorded on the page itself
    let root = storage
        .get_page_by_url(&format!("{}/", server.uri()))
        .unwrap()
        .unwrap();
    assert_eq!(root.links_count, 8);
}

#[tokio::test]
async fn test_failed_link_does_not_stop_siblings() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Root", &["/1", "/2", "/3"]).await;
    mount_page(&server, "/1", "One", &[]).await;
    Mock::given(method("GET"))
        .and(path("/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(&server, "/3", "Three", &[]).await;

    let dir = TempDir::new().unwrap();
    let (storage, db_path) = open_store(&dir);
    let config = create_test_config(vec![format!("{}/", server.uri())], 1, &db_path);

    let summary = Coordinator::from_config(&config, storage.clone())
        .run(&config.seeds)
        .await
        .unwrap();

    assert_eq!(summary.persisted, 3);
    assert_eq!(summary.fetch_failures, 1);
    assert!(storage
        .get_page_by_url(&format!("{}/1", server.uri()))
        .unwrap()
        .is_some());
    assert!(storage
        .get_page_by_url(&format!("{}/2", server.uri()))
        .unwrap()
        .is_none());
    assert!(storage
        .get_page_by_url(&format!("{}/3", server.uri()))
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_timed_out_link_does_not_stop_siblings() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Root", &["/1", "/2", "/3"]).await;
    mount_page(&server, "/1", "One", &[]).await;
    Mock::given(method("GET"))
        .and(path("/2"))
        .respond_with(page("Slow", &[]).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    mount_page(&server, "/3", "Three", &[]).await;

    let dir = TempDir::new().unwrap();
    let (storage, db_path) = open_store(&dir);
    let config = create_test_config(vec![format!("{}/", server.uri())], 1, &db_path);

    let summary = Coordinator::from_config(&config, storage.clone())
        .run(&config.seeds)
        .await
        .unwrap();

    assert_eq!(summary.persisted, 3);
    assert_eq!(summary.fetch_failures, 1);
    assert!(storage
        .get_page_by_url(&format!("{}/2", server.uri()))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_rerun_persists_nothing_new() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Root", &["/a", "/b"]).await;
    mount_page(&server, "/a", "A", &[]).await;
    mount_page(&server, "/b", "B", &[]).await;

    let dir = TempDir::new().unwrap();
    let (storage, db_path) = open_store(&dir);
    let config = create_test_config(vec![format!("{}/", server.uri())], 1, &db_path);

    let first = Coordinator::from_config(&config, storage.clone())
        .run(&config.seeds)
        .await
        .unwrap();
    assert_eq!(first.persisted, 3);

    let second = Coordinator::from_config(&config, storage.clone())
        .run(&config.seeds)
        .await
        .unwrap();

    assert_eq!(second.persisted, 0);
    assert_eq!(second.duplicates, 1);
    // The stored seed halts its subtree, so no child is fetched again
    assert_eq!(second.visited, 1);
    assert_eq!(storage.count_all().unwrap(), 3);

    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.persisted_count, 0);
}

#[tokio::test]
async fn test_link_cycle_terminates() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Root", &["/a"]).await;
    mount_page(&server, "/a", "A", &["/", "/a"]).await;

    let dir = TempDir::new().unwrap();
    let (storage, db_path) = open_store(&dir);
    let config = create_test_config(vec![format!("{}/", server.uri())], 5, &db_path);

    let summary = Coordinator::from_config(&config, storage.clone())
        .run(&config.seeds)
        .await
        .unwrap();

    assert_eq!(summary.visited, 2);
    assert_eq!(summary.persisted, 2);
    assert_eq!(requested_paths(&server).await.len(), 2);
}

#[tokio::test]
async fn test_seeds_shared_across_workers() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    let third = MockServer::start().await;
    for server in [&first, &second, &third] {
        mount_page(server, "/", "Seed", &["/child"]).await;
        mount_page(server, "/child", "Child", &[]).await;
    }

    let dir = TempDir::new().unwrap();
    let (storage, db_path) = open_store(&dir);
    let config = create_test_config(
        vec![
            format!("{}/", first.uri()),
            format!("{}/", second.uri()),
            format!("{}/", third.uri()),
        ],
        1,
        &db_path,
    );

    let summary = Coordinator::from_config(&config, storage.clone())
        .run(&config.seeds)
        .await
        .unwrap();

    assert_eq!(summary.workers, 2);
    assert_eq!(summary.persisted, 6);

    let by_worker = storage.count_by_worker().unwrap();
    let total: u64 = by_worker.iter().map(|(_, count)| count).sum();
    assert_eq!(total, 6);
    assert!(by_worker
        .iter()
        .all(|(worker, _)| worker == "worker-1" || worker == "worker-2"));

    // Every seed and its child were fetched by the same worker
    for server in [&first, &second, &third] {
        let seed = storage
            .get_page_by_url(&format!("{}/", server.uri()))
            .unwrap()
            .unwrap();
        let child = storage
            .get_page_by_url(&format!("{}/child", server.uri()))
            .unwrap()
            .unwrap();
        assert_eq!(seed.worker, child.worker);
    }
}

#[tokio::test]
async fn test_crawl_from_parsed_config() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Root", &["/a#top", "/a"]).await;
    mount_page(&server, "/a", "A", &[]).await;

    let dir = TempDir::new().unwrap();
    let (storage, db_path) = open_store(&dir);
    let toml = format!(
        r#"
seeds = ["{}/"]

[crawler]
max-depth = 1
workers = 1
strip-fragments = true

[politeness]
base-delay-ms = 10
jitter-ms = 10

[network]
timeout-secs = 2

[output]
database-path = "{}"
"#,
        server.uri(),
        db_path.replace('\\', "/")
    );
    let config = parse_config(&toml).expect("Config should parse");

    let summary = Coordinator::from_config(&config, storage.clone())
        .with_config_hash("integration")
        .run(&config.seeds)
        .await
        .unwrap();

    // With fragments stripped both links are the same address
    assert_eq!(summary.persisted, 2);
    assert_eq!(requested_paths(&server).await, vec!["/", "/a"]);
    assert_eq!(
        storage.get_latest_run().unwrap().unwrap().config_hash,
        "integration"
    );
}

#[tokio::test]
async fn test_ineligible_config_seed_is_excluded_not_fatal() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Good", &[]).await;

    let dir = TempDir::new().unwrap();
    let (storage, db_path) = open_store(&dir);
    let toml = format!(
        r#"
seeds = ["{}/", "ftp://bad.onion/", "{}/banner.png"]

[crawler]
max-depth = 0

[politeness]
base-delay-ms = 0
jitter-ms = 0

[output]
database-path = "{}"
"#,
        server.uri(),
        server.uri(),
        db_path.replace('\\', "/")
    );
    let config = parse_config(&toml).expect("Ineligible seeds should not fail loading");
    assert_eq!(config.seeds.len(), 3);

    let summary = Coordinator::from_config(&config, storage.clone())
        .run(&config.seeds)
        .await
        .unwrap();

    assert_eq!(summary.seeds, 1);
    assert_eq!(summary.skipped_seeds, 2);
    assert_eq!(summary.persisted, 1);
    assert_eq!(requested_paths(&server).await, vec!["/"]);
    assert!(storage
        .get_page_by_url(&format!("{}/", server.uri()))
        .unwrap()
        .is_some());
}
