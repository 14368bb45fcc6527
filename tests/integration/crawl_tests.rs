//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the fetcher and the full crawl cycle end-to-end.

use hostcrawl::config::{parse_config, Config, HttpConfig};
use hostcrawl::crawler::{start_crawl, Fetcher, HttpFetcher, Pipeline};
use hostcrawl::output::{ChannelObserver, CrawlEvent, CrawlStats};
use hostcrawl::FetchError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the mock server
fn create_test_config(seed: &str, extra: &str) -> Config {
    parse_config(&format!(
        r#"
[crawler]
seed = "{}"
workers = 4
queue-capacity = 64

[http]
user-agent = "TestBot/1.0"
timeout-secs = 5
connect-timeout-secs = 2
{}
"#,
        seed, extra
    ))
    .expect("Failed to parse test config")
}

async fn mount_page(server: &MockServer, page: &str, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(expected)
        .mount(server)
        .await;
}

/// Collects events until `done` matches one, failing after ten seconds
async fn wait_for(
    events: &mut UnboundedReceiver<CrawlEvent>,
    done: impl Fn(&CrawlEvent) -> bool,
) -> Vec<CrawlEvent> {
    let mut seen = Vec::new();
    let result = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(event) = events.recv().await {
            let finished = done(&event);
            seen.push(event);
            if finished {
                return;
            }
        }
    })
    .await;
    assert!(result.is_ok(), "Timed out waiting for event, saw {:?}", seen);
    seen
}

#[tokio::test]
async fn test_http_fetcher_returns_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("user-agent", "TestBot/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>hello</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = HttpConfig {
        user_agent: "TestBot/1.0".to_string(),
        ..HttpConfig::default()
    };
    let fetcher = HttpFetcher::from_config(&config).expect("Failed to build fetcher");

    let body = fetcher
        .fetch(&format!("{}/page", mock_server.uri()))
        .await
        .expect("Fetch should succeed");
    assert_eq!(body, "<p>hello</p>");
}

#[tokio::test]
async fn test_http_fetcher_reports_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::from_config(&HttpConfig::default()).expect("Failed to build fetcher");
    let url = format!("{}/missing", mock_server.uri());

    match fetcher.fetch(&url).await {
        Err(FetchError::Status { url: failed, status }) => {
            assert_eq!(failed, url);
            assert_eq!(status, 404);
        }
        other => panic!("Expected a status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_fetcher_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let config = HttpConfig {
        timeout_secs: 1,
        ..HttpConfig::default()
    };
    let fetcher = HttpFetcher::from_config(&config).expect("Failed to build fetcher");

    let result = fetcher.fetch(&format!("{}/slow", mock_server.uri())).await;
    assert!(matches!(result, Err(FetchError::Timeout { .. })));
}

#[tokio::test]
async fn test_http_fetcher_reports_truncated_body() {
    let mock_server = MockServer::start().await;

    // Declares more bytes than it sends, so reading the body fails
    Mock::given(method("GET"))
        .and(path("/truncated"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-length", "1000")
                .set_body_string("<p>short</p>"),
        )
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::from_config(&HttpConfig::default()).expect("Failed to build fetcher");
    let url = format!("{}/truncated", mock_server.uri());

    match fetcher.fetch(&url).await {
        Err(FetchError::Read { url: failed, .. }) => assert_eq!(failed, url),
        other => panic!("Expected a read error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_full_crawl_single_host() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        format!(
            r#"<html><body>
            <a href="http://other.test/x">Elsewhere</a>
            <a href="{}/about">About</a>
            </body></html>"#,
            base_url
        ),
        1,
    )
    .await;
    mount_page(&mock_server, "/about", "<p>About</p>".to_string(), 1).await;

    let config = create_test_config(&format!("{}/", base_url), "");
    let (observer, mut events) = ChannelObserver::new();
    let stats = Arc::new(CrawlStats::new());

    let mut pipeline = Pipeline::from_config(&config)
        .expect("Failed to build pipeline")
        .with_observer(stats.clone())
        .with_observer(Arc::new(observer));

    pipeline.run().expect("Failed to start pipeline");
    pipeline
        .submit(format!("{}/", base_url))
        .await
        .expect("Failed to submit seed");

    let about = format!("{}/about", base_url);
    let seen = wait_for(&mut events, |event| {
        matches!(event, CrawlEvent::Fetched { url, .. } if *url == about)
    })
    .await;

    assert!(pipeline.counter().get() >= 2);
    assert!(seen
        .iter()
        .any(|event| matches!(event, CrawlEvent::Rejected { url, .. } if url == "http://other.test/x")));
    assert!(!seen
        .iter()
        .any(|event| matches!(event, CrawlEvent::Accepted { url, .. } if url.contains("other.test"))));

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.accepted, 2);
    assert_eq!(snapshot.fetched, 2);
    assert_eq!(snapshot.rejected, 1);

    pipeline.shutdown();
    pipeline.stopped().await;
}

#[tokio::test]
async fn test_crawl_with_relative_links_and_exclusions() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/about">About</a>
           <link href="/style.css">
           <a href="docs/intro">Intro</a>"#
            .to_string(),
        1,
    )
    .await;
    mount_page(&mock_server, "/about", String::new(), 1).await;
    mount_page(&mock_server, "/docs/intro", String::new(), 1).await;
    mount_page(&mock_server, "/style.css", String::new(), 0).await;

    let mut config = create_test_config(
        &format!("{}/", base_url),
        r#"
[[filter]]
kind = "host-contains"

[[filter]]
kind = "exclude-pattern"
pattern = "\\.css$"
"#,
    );
    config.crawler.link_pattern = Some(r#"href="([^"]*)""#.to_string());

    let (observer, mut events) = ChannelObserver::new();
    let mut pipeline = Pipeline::from_config(&config)
        .expect("Failed to build pipeline")
        .with_observer(Arc::new(observer));

    pipeline.run().expect("Failed to start pipeline");
    pipeline
        .submit(format!("{}/", base_url))
        .await
        .expect("Failed to submit seed");

    let mut fetched = Vec::new();
    let result = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(event) = events.recv().await {
            if let CrawlEvent::Fetched { url, .. } = event {
                fetched.push(url);
            }
            if fetched.iter().any(|u| u.ends_with("/about"))
                && fetched.iter().any(|u| u.ends_with("/docs/intro"))
            {
                return;
            }
        }
    })
    .await;
    assert!(result.is_ok(), "Timed out, fetched only {:?}", fetched);
    assert!(!fetched.iter().any(|u| u.ends_with(".css")));

    pipeline.shutdown();
    pipeline.stopped().await;
}

#[tokio::test]
async fn test_start_crawl_submits_seed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/start",
        format!(r#"<a href="{}/next">Next</a>"#, base_url),
        1,
    )
    .await;
    mount_page(&mock_server, "/next", String::new(), 1).await;

    let config = create_test_config(&format!("{}/start", base_url), "");
    let mut pipeline = start_crawl(&config).await.expect("Failed to start crawl");
    assert!(pipeline.is_running());

    let counter = pipeline.counter();
    let reached = tokio::time::timeout(Duration::from_secs(10), async {
        while counter.get() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "Crawl never reached the linked page");

    // Let the fetch of /next finish before the mock expectations are checked
    tokio::time::sleep(Duration::from_millis(200)).await;

    pipeline.shutdown();
    pipeline.stopped().await;
    assert_eq!(counter.get(), 2);
}
