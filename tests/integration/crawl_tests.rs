//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the catalog site and the WebDriver
//! broker, and run the full crawl cycle end-to-end against real stores.

use reel_tracks::config::load_config_with_hash;
use reel_tracks::crawler::run_crawl;
use reel_tracks::storage::{BlobStore, FsBlobStore, RecordStore, RunLog, RunStatus, SqliteStore};
use reel_tracks::{CapturedDocument, Coordinator, ReelError};
use std::io::Write;
use std::path::Path;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Writes a config pointing at `base_url`, with stores under `dir` and no pacing
fn write_config(base_url: &str, dir: &Path, keys: &str, session: &str) -> NamedTempFile {
    let content = format!(
        r#"
[site]
base-url = "{base_url}"
listing-path = "/browse/{{key}}"
entry-path-pattern = "/Movies/Soundtrack/*"

[keys]
{keys}

[session]
max-attempts = 2
retry-delay-ms = 10
element-wait-timeout-ms = 200
{session}

[crawler]
entry-pace-ms = 0
key-pace-ms = 0

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
database-path = "{db}"
blob-root = "{blobs}"
report-path = "{report}"
"#,
        db = dir.join("catalog.db").display(),
        blobs = dir.join("blobs").display(),
        report = dir.join("report.md").display(),
    );

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

async fn mount_page(server: &MockServer, page_path: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html.to_string())
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn open_store(dir: &TempDir) -> SqliteStore {
    SqliteStore::new(&dir.path().join("catalog.db"), "soundtrack_items").unwrap()
}

const LISTING_A: &str = r#"<html><body>
    <a href="/about">About</a>
    <ul class="movies">
      <li><a href="/Movies/Soundtrack/A1">Alpha</a></li>
      <li><a href="/Movies/Soundtrack/A2">Alpha Returns</a></li>
    </ul>
</body></html>"#;

const DETAIL_A1: &str = r#"<html><body>
    <h1>Alpha Soundtrack</h1>
    <div data-song-id="101"><span class="song-title">Opening</span><span class="song-artist">Composer</span></div>
    <div data-song-id="102"><span class="song-title">Chase</span><span class="song-artist">The Band</span></div>
    <div data-song-id="103"><span class="song-title">Finale</span><span class="song-artist">Composer</span></div>
</body></html>"#;

const DETAIL_A2: &str = r#"<html><body>
    <p>This page moved.</p>
</body></html>"#;

#[tokio::test]
async fn test_full_crawl_single_key() {
    let server = MockServer::start().await;
    mount_page(&server, "/browse/A", LISTING_A).await;
    mount_page(&server, "/Movies/Soundtrack/A1", DETAIL_A1).await;
    mount_page(&server, "/Movies/Soundtrack/A2", DETAIL_A2).await;

    let dir = TempDir::new().unwrap();
    let config_file = write_config(
        &server.uri(),
        dir.path(),
        "kind = \"list\"\nvalues = [\"A\"]",
        "",
    );
    let (config, hash) = load_config_with_hash(config_file.path()).unwrap();

    let summary = run_crawl(&config, &hash).await.unwrap();

    assert_eq!(summary.keys_processed, 1);
    assert_eq!(summary.entries_seen, 2);
    assert_eq!(summary.records_persisted, 3);
    assert_eq!(summary.entries_with_zero_records, 1);
    assert_eq!(summary.blobs_written, 1);

    let store = open_store(&dir);
    let rows = store.records_for_entry("A1").unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.entry_title == "Alpha"));
    assert!(store.records_for_entry("A2").unwrap().is_empty());

    let blobs = FsBlobStore::new(dir.path().join("blobs")).unwrap();
    assert_eq!(blobs.keys().unwrap(), vec!["entries/A1/data".to_string()]);
    let document: CapturedDocument =
        serde_json::from_slice(&blobs.get("entries/A1/data").unwrap().unwrap()).unwrap();
    assert_eq!(document.entry.entry_id, "A1");
    assert_eq!(document.records.len(), 3);

    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, hash);

    let report = std::fs::read_to_string(dir.path().join("report.md")).unwrap();
    assert!(report.contains("- **Records Persisted**: 3"));
}

#[tokio::test]
async fn test_recrawl_does_not_duplicate_rows() {
    let server = MockServer::start().await;
    mount_page(&server, "/browse/A", LISTING_A).await;
    mount_page(&server, "/Movies/Soundtrack/A1", DETAIL_A1).await;
    mount_page(&server, "/Movies/Soundtrack/A2", DETAIL_A2).await;

    let dir = TempDir::new().unwrap();
    let config_file = write_config(
        &server.uri(),
        dir.path(),
        "kind = \"list\"\nvalues = [\"A\"]",
        "",
    );
    let (config, hash) = load_config_with_hash(config_file.path()).unwrap();

    run_crawl(&config, &hash).await.unwrap();
    run_crawl(&config, &hash).await.unwrap();

    let store = open_store(&dir);
    assert_eq!(store.count_records().unwrap(), 3);
    assert_eq!(store.count_entries().unwrap(), 1);
    assert_eq!(store.get_latest_run().unwrap().unwrap().id, 2);
}

#[tokio::test]
async fn test_zero_entry_key_advances() {
    let server = MockServer::start().await;
    mount_page(&server, "/browse/A", "<html><body><p>No titles</p></body></html>").await;
    mount_page(&server, "/browse/B", LISTING_A).await;
    mount_page(&server, "/Movies/Soundtrack/A1", DETAIL_A1).await;
    mount_page(&server, "/Movies/Soundtrack/A2", DETAIL_A1).await;

    let dir = TempDir::new().unwrap();
    let config_file = write_config(
        &server.uri(),
        dir.path(),
        "kind = \"letters\"\nfrom = \"A\"\nto = \"B\"",
        "",
    );
    let (config, hash) = load_config_with_hash(config_file.path()).unwrap();

    let summary = run_crawl(&config, &hash).await.unwrap();

    assert_eq!(summary.keys_processed, 2);
    assert_eq!(summary.listing_failures, 0);
    assert_eq!(summary.entries_seen, 2);
    assert_eq!(summary.records_persisted, 6);
}

#[tokio::test]
async fn test_listing_error_is_counted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/browse/A"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config_file = write_config(
        &server.uri(),
        dir.path(),
        "kind = \"list\"\nvalues = [\"A\"]",
        "",
    );
    let (config, hash) = load_config_with_hash(config_file.path()).unwrap();

    let summary = run_crawl(&config, &hash).await.unwrap();

    assert_eq!(summary.keys_processed, 1);
    assert_eq!(summary.listing_failures, 1);
    assert_eq!(summary.entries_seen, 0);
}

#[tokio::test]
async fn test_key_filter_limits_run() {
    let server = MockServer::start().await;
    mount_page(&server, "/browse/C", "<html><body></body></html>").await;

    let dir = TempDir::new().unwrap();
    let config_file = write_config(
        &server.uri(),
        dir.path(),
        "kind = \"letters\"\nfrom = \"A\"\nto = \"E\"",
        "",
    );
    let (config, hash) = load_config_with_hash(config_file.path()).unwrap();

    let summary = Coordinator::from_config(&config, &hash)
        .unwrap()
        .with_key_filter(vec!["C".to_string()])
        .run()
        .await
        .unwrap();

    assert_eq!(summary.keys_processed, 1);
    assert_eq!(summary.listing_failures, 0);
}

#[tokio::test]
async fn test_interrupted_run_is_recorded() {
    let server = MockServer::start().await;

    let dir = TempDir::new().unwrap();
    let config_file = write_config(
        &server.uri(),
        dir.path(),
        "kind = \"list\"\nvalues = [\"A\"]",
        "",
    );
    let (config, hash) = load_config_with_hash(config_file.path()).unwrap();

    let coordinator = Coordinator::from_config(&config, &hash).unwrap();
    coordinator.cancellation_token().cancel();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.keys_processed, 0);
    let run = open_store(&dir).get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Interrupted);
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn test_webdriver_rejection_fails_preflight() {
    let catalog = MockServer::start().await;
    let broker = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "value": {
                "error": "session not created",
                "message": "no matching browser",
                "stacktrace": ""
            }
        })))
        .expect(1)
        .mount(&broker)
        .await;

    let dir = TempDir::new().unwrap();
    let session = format!("backend = \"webdriver\"\nendpoint = \"{}\"", broker.uri());
    let config_file = write_config(
        &catalog.uri(),
        dir.path(),
        "kind = \"list\"\nvalues = [\"A\"]",
        &session,
    );
    let (config, hash) = load_config_with_hash(config_file.path()).unwrap();

    let result = run_crawl(&config, &hash).await;

    assert!(matches!(
        result,
        Err(ReelError::SessionUnavailable { attempts: 1, .. })
    ));
    let run = open_store(&dir).get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
}

#[tokio::test]
async fn test_webdriver_crawl_of_empty_key() {
    let catalog = MockServer::start().await;
    let broker = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": { "sessionId": "s-1", "capabilities": {} }
        })))
        .mount(&broker)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s-1/url"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": null })),
        )
        .mount(&broker)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/s-1/source"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": "<html><body><p>Nothing listed</p></body></html>"
        })))
        .mount(&broker)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/session/s-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": null })),
        )
        .expect(2)
        .mount(&broker)
        .await;

    let dir = TempDir::new().unwrap();
    let session = format!("backend = \"webdriver\"\nendpoint = \"{}\"", broker.uri());
    let config_file = write_config(
        &catalog.uri(),
        dir.path(),
        "kind = \"list\"\nvalues = [\"A\"]",
        &session,
    );
    let (config, hash) = load_config_with_hash(config_file.path()).unwrap();

    let summary = run_crawl(&config, &hash).await.unwrap();

    assert_eq!(summary.keys_processed, 1);
    assert_eq!(summary.entries_seen, 0);
    assert_eq!(summary.listing_failures, 0);
}

#[tokio::test]
async fn test_webdriver_sessions_closed_after_failed_detail() {
    let catalog = MockServer::start().await;
    let broker = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": { "sessionId": "s-1", "capabilities": {} }
        })))
        .expect(3)
        .mount(&broker)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s-1/url"))
        .and(body_partial_json(serde_json::json!({
            "url": format!("{}/browse/A", catalog.uri())
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": null })),
        )
        .mount(&broker)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s-1/url"))
        .and(body_partial_json(serde_json::json!({
            "url": format!("{}/Movies/Soundtrack/A1", catalog.uri())
        })))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "value": {
                "error": "unknown error",
                "message": "net::ERR_CONNECTION_RESET",
                "stacktrace": ""
            }
        })))
        .expect(1)
        .mount(&broker)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/s-1/source"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": "<html><body><a href=\"/Movies/Soundtrack/A1\">Alpha</a></body></html>"
        })))
        .mount(&broker)
        .await;
    // pre-flight, listing and the failed detail each close their session
    Mock::given(method("DELETE"))
        .and(path("/session/s-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": null })),
        )
        .expect(3)
        .mount(&broker)
        .await;

    let dir = TempDir::new().unwrap();
    let session = format!("backend = \"webdriver\"\nendpoint = \"{}\"", broker.uri());
    let config_file = write_config(
        &catalog.uri(),
        dir.path(),
        "kind = \"list\"\nvalues = [\"A\"]",
        &session,
    );
    let (config, hash) = load_config_with_hash(config_file.path()).unwrap();

    let summary = run_crawl(&config, &hash).await.unwrap();

    assert_eq!(summary.entries_seen, 1);
    assert_eq!(summary.detail_failures, 1);
    assert_eq!(summary.records_persisted, 0);
    assert_eq!(open_store(&dir).count_records().unwrap(), 0);
}
