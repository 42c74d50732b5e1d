//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xpo_harvest::aggregator::ExternalOutcome;
use xpo_harvest::config::{parse_config, Config, CrawlMode, RunOverrides, RunParams};
use xpo_harvest::crawler::run_crawl;
use xpo_harvest::output::{JsonFileSink, JsonOptions, MemorySink, RecordSink};
use xpo_harvest::processor::SourceType;
use xpo_harvest::ConfigError;

/// Creates a test configuration writing into `output_dir`
fn create_test_config(output_dir: &Path) -> Config {
    parse_config(&format!(
        r#"
[crawler]
max-concurrent-fetches = 4
request-timeout = 5

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
output-dir = "{}"
"#,
        output_dir.display()
    ))
    .expect("Failed to parse test config")
}

fn run_params(config: &Config, start_url: String, mode: CrawlMode, depth: u32) -> RunParams {
    RunParams::resolve(
        config,
        &RunOverrides {
            start_url: Some(start_url),
            run_identifier: Some("Test".to_string()),
            depth_limit: Some(depth),
            mode: Some(mode),
        },
    )
    .expect("Failed to resolve run")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: &str, hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .expect(hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_site_crawl_fetches_one_language_variant() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <a href="/en/b">English</a>
            <a href="/nl/b">Nederlands</a>
            <a href="/">Home</a>
        </body></html>"#,
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/en/b",
        r#"<html><head><title>Exhibitors</title></head><body>
            Visit us at Stand 42
            <a href="/">Home</a>
        </body></html>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/nl/b", "<p>Standhouders</p>", 0).await;

    let config = create_test_config(dir.path());
    let params = run_params(
        &config,
        format!("{}/", mock_server.uri()),
        CrawlMode::Site,
        0,
    );
    let sink = Arc::new(MemorySink::new());

    let stats = run_crawl(&config, params, sink.clone())
        .await
        .expect("Crawl failed");

    let pages = sink.pages();
    assert_eq!(pages.len(), 2);
    let exhibitors = pages
        .iter()
        .find(|p| p.url.ends_with("/en/b"))
        .expect("English page missing");
    assert_eq!(exhibitors.title, "Exhibitors");
    assert_eq!(exhibitors.run_identifier, "test");
    assert_eq!(exhibitors.booth_number.as_deref(), Some("42"));
    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.fetch_failures, 0);
}

#[tokio::test]
async fn test_crawl_with_depth_limit() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(&mock_server, "/", r#"<a href="/level1">1</a>"#, 1).await;
    mount_page(&mock_server, "/level1", r#"<a href="/level2">2</a>"#, 1).await;
    mount_page(&mock_server, "/level2", r#"<a href="/level3">3</a>"#, 0).await;

    let config = create_test_config(dir.path());
    let params = run_params(
        &config,
        format!("{}/", mock_server.uri()),
        CrawlMode::Site,
        1,
    );
    let sink = Arc::new(MemorySink::new());

    let stats = run_crawl(&config, params, sink.clone())
        .await
        .expect("Crawl failed");

    assert_eq!(sink.pages().len(), 2);
    assert_eq!(stats.policy_drops, 1);
}

#[tokio::test]
async fn test_pdf_and_non_html_are_not_recorded() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/floorplan.pdf">Plan</a><a href="/data">Data</a>"#,
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/floorplan.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF".to_vec(), "application/pdf"))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(dir.path());
    let params = run_params(
        &config,
        format!("{}/", mock_server.uri()),
        CrawlMode::Site,
        0,
    );
    let sink = Arc::new(MemorySink::new());

    let stats = run_crawl(&config, params, sink.clone())
        .await
        .expect("Crawl failed");

    assert_eq!(sink.pages().len(), 1);
    assert_eq!(stats.fetch_failures, 1);
}

#[tokio::test]
async fn test_events_crawl_collects_external_results() {
    let site = MockServer::start().await;
    let external = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &site,
        "/kalender/",
        r#"<a href="/kalender/event/pxk/7/artisan/">Artisan</a>"#,
        1,
    )
    .await;
    mount_page(
        &site,
        "/kalender/event/pxk/7/artisan/",
        &format!(
            r#"<html><body>
                <h1>Artisan</h1>
                <div class="event-date">12 - 14 maart</div>
                <a href="{ext}/home">Website</a>
                <a href="{ext}/tickets">Tickets</a>
                <a href="{ext}/broken">Broken</a>
                <a href="/kalender/">Back</a>
            </body></html>"#,
            ext = external.uri()
        ),
        1,
    )
    .await;

    mount_page(
        &external,
        "/home",
        r#"<html><head><title>Artisan fair</title></head><body>
            <p>Contact info@artisan.test</p>
            <a href="/shop">Buy tickets</a>
        </body></html>"#,
        1,
    )
    .await;
    mount_page(&external, "/tickets", "<p>Sold out</p>", 1).await;
    mount_page(
        &external,
        "/shop",
        r#"<html><head><title>Shop</title></head><body><a href="/shop/basket">Buy tickets</a></body></html>"#,
        1,
    )
    .await;
    mount_page(&external, "/shop/basket", "<p>Basket</p>", 0).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&external)
        .await;

    let config = create_test_config(dir.path());
    let params = run_params(
        &config,
        format!("{}/kalender/", site.uri()),
        CrawlMode::Events,
        0,
    );
    let sink = Arc::new(MemorySink::new());

    let stats = run_crawl(&config, params, sink.clone())
        .await
        .expect("Crawl failed");

    let parents = sink.parents();
    assert_eq!(parents.len(), 1);

    let artisan = &parents[0];
    assert_eq!(artisan.fields.title, "Artisan");
    assert_eq!(artisan.fields.date.as_deref(), Some("12 - 14 maart"));
    assert_eq!(artisan.external_data.len(), 4);
    assert_eq!(artisan.error_count(), 1);

    let home = artisan
        .external_data
        .iter()
        .find(|r| r.url.ends_with("/home"))
        .expect("home result missing");
    match &home.outcome {
        ExternalOutcome::Success(page) => {
            assert_eq!(page.title, "Artisan fair");
            assert_eq!(page.contact_info.email, vec!["info@artisan.test"]);
            assert!(page.ticket_url.as_deref().unwrap_or("").ends_with("/shop"));
        }
        other => panic!("expected success, got {:?}", other),
    }

    let shop = artisan
        .external_data
        .iter()
        .find(|r| r.url.ends_with("/shop"))
        .expect("booking subpage missing");
    match &shop.outcome {
        ExternalOutcome::Success(page) => {
            assert_eq!(page.title, "Shop");
            assert_eq!(page.source_type, SourceType::ExternalEventSubpage);
        }
        other => panic!("expected success, got {:?}", other),
    }

    let broken = artisan
        .external_data
        .iter()
        .find(|r| r.url.ends_with("/broken"))
        .expect("broken result missing");
    assert_eq!(broken.error_message(), Some("HTTP status 500"));

    assert_eq!(stats.parents_opened, 1);
    assert_eq!(stats.parents_finalized, 1);
    assert_eq!(stats.child_successes, 3);
    assert_eq!(stats.child_errors, 1);
    assert_eq!(stats.unfinished_parents, 0);
    assert!(sink.pages().is_empty());
}

#[tokio::test]
async fn test_offsite_redirect_not_recorded() {
    let site = MockServer::start().await;
    let elsewhere = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/landing", elsewhere.uri()).as_str()),
        )
        .expect(1)
        .mount(&site)
        .await;
    mount_page(
        &elsewhere,
        "/landing",
        r#"<html><head><title>Elsewhere</title></head><body><a href="/next">Next</a></body></html>"#,
        1,
    )
    .await;
    mount_page(&elsewhere, "/next", "<p>Next</p>", 0).await;

    let config = create_test_config(dir.path());
    let params = run_params(&config, format!("{}/", site.uri()), CrawlMode::Site, 0);
    let sink = Arc::new(MemorySink::new());

    let stats = run_crawl(&config, params, sink.clone())
        .await
        .expect("Crawl failed");

    assert!(sink.pages().is_empty());
    assert_eq!(stats.policy_drops, 1);
}

#[tokio::test]
async fn test_json_output_written() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<html><head><title>Flooring Days</title></head><body>Welcome</body></html>"#,
        1,
    )
    .await;

    let config = create_test_config(dir.path());
    let params = run_params(
        &config,
        format!("{}/", mock_server.uri()),
        CrawlMode::Site,
        0,
    );
    let sink = Arc::new(JsonFileSink::for_run(
        dir.path(),
        &params.run_identifier,
        params.mode,
        JsonOptions::default(),
    ));

    let stats = run_crawl(&config, params, sink.clone() as Arc<dyn RecordSink>)
        .await
        .expect("Crawl failed");
    assert_eq!(stats.records_written, 1);

    let written = std::fs::read_to_string(dir.path().join("test_site_data.json")).unwrap();
    let records: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(records[0]["title"], "Flooring Days");
    assert_eq!(records[0]["source_type"], "event_site");
    assert_eq!(records[0]["run_identifier"], "test");
}

#[test]
fn test_missing_start_url_rejected() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let result = RunParams::resolve(&config, &RunOverrides::default());
    assert!(matches!(result, Err(ConfigError::MissingStartUrl)));
}
