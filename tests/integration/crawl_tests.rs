//! Integration tests for the crawler
//!
//! These tests use wiremock to serve listing pages and run the full
//! fetch, cache, extract and persist cycle against a temporary database.

use catalog_harvest::cache::RawCache;
use catalog_harvest::config::{load_config, Config};
use catalog_harvest::crawler::{crawl_sites, reprocess_sites, select_sites, HttpFetcher, RunOptions};
use catalog_harvest::output::load_statistics;
use catalog_harvest::storage::{open_storage, MediaKind, SqliteStorage, Storage};
use catalog_harvest::Termination;
use std::io::Write;
use std::path::Path;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Writes a one-site configuration pointing at the mock server
fn write_config(base_url: &str, db_path: &Path, site_extra: &str) -> NamedTempFile {
    let content = format!(
        r#"
[fetcher]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
timeout-secs = 5

[storage]
database-path = "{db}"

[[site]]
id = "alpha"
name = "Alpha Store"
page-url = "{base}/item/{{id}}"
start-id = "1"
breaker-threshold = 2
delay-ms = 0
site-names = ["Alpha Store"]
{extra}

[site.scheme]
kind = "numeric"
min = 1
max = 100
"#,
        db = db_path.display(),
        base = base_url,
        extra = site_extra
    );

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn product_page(title: &str, performers: &[&str]) -> String {
    let links: String = performers
        .iter()
        .map(|p| format!("<a href=\"/performer/{}\">{}</a> ", p, p))
        .collect();
    format!(
        r#"<html><head>
<title>{title} | Alpha Store</title>
<meta property="og:description" content="A long description of {title}.">
<meta property="og:image" content="/img/{title}.jpg">
</head><body>
<h1>{title}</h1>
<table>
<tr><th>Release Date</th><td>2024-03-01</td></tr>
<tr><th>Duration</th><td>120 min</td></tr>
<tr><th>Performers</th><td>{links}</td></tr>
<tr><th>Genre</th><td><a href="/genre/1">Drama</a></td></tr>
</table>
<a class="sample-image" href="/samples/1.jpg">1</a>
<a class="sample-image" href="/samples/2.jpg">2</a>
</body></html>"#,
        title = title,
        links = links
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8"))
        .mount(server)
        .await;
}

async fn run_crawl(config: &Config, options: &RunOptions) -> catalog_harvest::RunSummary {
    let sites = select_sites(config, "all").unwrap();
    let fetcher = HttpFetcher::new(&config.fetcher).unwrap();
    let mut storage = open_storage(Path::new(&config.storage.database_path)).unwrap();

    let mut summaries = crawl_sites(&fetcher, &mut storage, &sites, options)
        .await
        .unwrap();
    assert_eq!(summaries.len(), 1);
    summaries.remove(0)
}

#[tokio::test]
async fn test_full_crawl_until_breaker() {
    let server = MockServer::start().await;
    mount_page(&server, "/item/1", product_page("Spring", &["Jane Roe", "Mary Major"])).await;
    mount_page(&server, "/item/2", product_page("Summer", &["Jane Roe"])).await;
    // Everything else falls through to wiremock's default 404

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config_file = write_config(&server.uri(), &db_path, "");
    let config = load_config(config_file.path()).unwrap();

    let summary = run_crawl(&config, &RunOptions::default()).await;

    assert_eq!(summary.imported, 2);
    assert_eq!(summary.not_found, 2);
    assert_eq!(summary.requests, 4);
    assert_eq!(summary.termination, Termination::Breaker);
    assert_eq!(summary.last_id.as_deref(), Some("4"));

    let storage = SqliteStorage::new(&db_path).unwrap();
    let item = storage.get_catalog_item("alpha", "1").unwrap().unwrap();
    assert_eq!(item.title.as_deref(), Some("Spring"));
    assert_eq!(item.duration_minutes, Some(120));
    assert_eq!(
        item.release_date,
        chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
    );
    assert_eq!(
        item.cover_url,
        Some(format!("{}/img/Spring.jpg", server.uri()))
    );

    let mut performers = storage.get_item_performers(item.id).unwrap();
    performers.sort();
    assert_eq!(performers, vec!["Jane Roe", "Mary Major"]);
    assert_eq!(storage.get_item_tags(item.id).unwrap(), vec!["Drama"]);

    let media = storage.get_media_assets(item.id).unwrap();
    assert_eq!(media.len(), 3);
    assert_eq!(
        media
            .iter()
            .filter(|m| m.kind == MediaKind::Sample)
            .count(),
        2
    );

    let stats = load_statistics(&storage).unwrap();
    assert_eq!(stats.total_items, 2);
    // Jane Roe appears on both pages but is stored once
    assert_eq!(stats.performers, 2);
    assert_eq!(stats.performer_links, 3);
    assert_eq!(stats.captures_processed, 2);
    assert_eq!(stats.captures_pending, 0);
}

#[tokio::test]
async fn test_second_run_skips_processed_captures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/item/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(product_page("Autumn", &["Jane Roe"]), "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config_file = write_config(&server.uri(), &db_path, "");
    let config = load_config(config_file.path()).unwrap();

    let first = run_crawl(&config, &RunOptions::default()).await;
    assert_eq!(first.imported, 1);

    let second = run_crawl(&config, &RunOptions::default()).await;
    assert_eq!(second.imported, 0);
    assert_eq!(second.skipped, 1);
    // Only the two missing candidates hit the network
    assert_eq!(second.requests, 2);
    assert_eq!(second.termination, Termination::Breaker);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_catalog_items().unwrap(), 1);
    assert_eq!(storage.count_performer_links().unwrap(), 1);
}

#[tokio::test]
async fn test_end_id_and_limit_stop_the_crawl() {
    let server = MockServer::start().await;
    for id in 1..=5 {
        mount_page(&server, &format!("/item/{}", id), product_page(&format!("Title {}", id), &[])).await;
    }

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config_file = write_config(&server.uri(), &db_path, "end-id = \"3\"");
    let config = load_config(config_file.path()).unwrap();

    let bounded = run_crawl(&config, &RunOptions::default()).await;
    assert_eq!(bounded.imported, 3);
    assert_eq!(bounded.termination, Termination::EndBoundary);

    // Same database, no end id: resume past the boundary with an import limit
    let open_file = write_config(&server.uri(), &db_path, "");
    let open_config = load_config(open_file.path()).unwrap();
    let limited = run_crawl(
        &open_config,
        &RunOptions {
            limit: Some(1),
            start: Some("4".to_string()),
            refetch: false,
        },
    )
    .await;
    assert_eq!(limited.imported, 1);
    assert_eq!(limited.termination, Termination::LimitReached);
    assert_eq!(limited.requests, 1);
    assert_eq!(limited.last_id.as_deref(), Some("4"));

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_catalog_items().unwrap(), 4);
}

#[tokio::test]
async fn test_shift_jis_page_is_decoded() {
    let server = MockServer::start().await;
    let html = "<html><head><title>春の特集 | Alpha Store</title></head><body>\
        <table><tr><th>出演者</th><td><a href=\"/p/1\">山田花子</a></td></tr>\
        <tr><th>収録時間</th><td>95分</td></tr>\
        <tr><th>発売日</th><td>2024年3月1日</td></tr></table></body></html>";
    let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode(html);
    Mock::given(method("GET"))
        .and(path("/item/1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(bytes.into_owned(), "text/html; charset=Shift_JIS"),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config_file = write_config(&server.uri(), &db_path, "end-id = \"1\"");
    let config = load_config(config_file.path()).unwrap();

    let summary = run_crawl(&config, &RunOptions::default()).await;
    assert_eq!(summary.imported, 1);

    let storage = SqliteStorage::new(&db_path).unwrap();
    let item = storage.get_catalog_item("alpha", "1").unwrap().unwrap();
    assert_eq!(item.title.as_deref(), Some("春の特集"));
    assert_eq!(item.duration_minutes, Some(95));
    assert_eq!(
        item.release_date,
        chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
    );
    assert_eq!(storage.get_item_performers(item.id).unwrap(), vec!["山田花子"]);

    // The cache holds decoded text, not raw bytes
    let capture = storage.lookup("alpha", "1").unwrap().unwrap();
    assert!(capture.text.contains("春の特集"));
}

#[tokio::test]
async fn test_side_channel_supplies_fields() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/item/1",
        "<html><head><title>Page Title | Alpha Store</title></head><body></body></html>".to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"title": "Api Title", "duration": "PT1H30M",
                "performers": [{"name": "Jane Roe", "reading": "jein roo"}],
                "genres": [{"name": "Drama"}]}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("catalog.db");
    let extra = format!(
        "api-url = \"{}/api/{{id}}\"\nend-id = \"2\"\n\n[site.extraction]\nprofile = \"api-first\"",
        server.uri()
    );
    let config_file = write_config(&server.uri(), &db_path, &extra);
    let config = load_config(config_file.path()).unwrap();

    let summary = run_crawl(&config, &RunOptions::default()).await;
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.not_found, 1);
    // Page and side channel for item 1, page only for item 2
    assert_eq!(summary.requests, 3);

    let storage = SqliteStorage::new(&db_path).unwrap();
    let item = storage.get_catalog_item("alpha", "1").unwrap().unwrap();
    assert_eq!(item.title.as_deref(), Some("Api Title"));
    assert_eq!(item.duration_minutes, Some(90));

    let performer = storage.get_performer_by_name("Jane Roe").unwrap().unwrap();
    assert_eq!(performer.reading.as_deref(), Some("jein roo"));
    assert_eq!(storage.get_item_tags(item.id).unwrap(), vec!["Drama"]);

    let api_capture = storage.lookup("alpha:api", "1").unwrap().unwrap();
    assert!(api_capture.is_processed());
}

#[tokio::test]
async fn test_reprocess_folds_pending_captures() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("catalog.db");
    let config_file = write_config(&server.uri(), &db_path, "");
    let config = load_config(config_file.path()).unwrap();

    {
        let mut storage = open_storage(&db_path).unwrap();
        storage
            .store("alpha", "7", "https://alpha.example/7", &product_page("Cached", &[]))
            .unwrap();
    }

    let sites = select_sites(&config, "alpha").unwrap();
    let fetcher = HttpFetcher::new(&config.fetcher).unwrap();
    let mut storage = open_storage(&db_path).unwrap();
    let summaries = reprocess_sites(&fetcher, &mut storage, &sites).unwrap();

    assert_eq!(summaries[0].imported, 1);
    assert_eq!(summaries[0].requests, 0);
    assert_eq!(storage.count_captures(false).unwrap(), 0);
    assert!(storage.get_catalog_item("alpha", "7").unwrap().is_some());
}
