//! Integration tests for page fetching and metadata parsing against mock trackers.

use std::time::Duration;

use chrono::NaiveDate;
use magnet_sync_core::tracker::{NnmProvider, RutrackerProvider};
use magnet_sync_core::{
    FetchError, MetadataParser, MetadataSource, PageFetcher, ProviderRegistry, TrackerError,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::pages::{comment_feed, nnm_topic, rutracker_topic};
use support::socket_guard::start_mock_server_or_skip;

fn registry_for(server: &MockServer) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(Box::new(RutrackerProvider::with_base_url(format!(
        "{}/rutracker",
        server.uri()
    ))));
    registry.register(Box::new(NnmProvider::with_base_url(format!(
        "{}/nnm",
        server.uri()
    ))));
    registry
}

fn parser_for(server: &MockServer) -> MetadataParser {
    let fetcher = PageFetcher::new().expect("fetcher should build");
    MetadataParser::new(fetcher, registry_for(server))
}

fn windows_1251(text: &str) -> Vec<u8> {
    let (bytes, _, had_errors) = encoding_rs::WINDOWS_1251.encode(text);
    assert!(!had_errors, "fixture must be representable in windows-1251");
    bytes.into_owned()
}

#[tokio::test]
async fn test_fetch_decodes_windows_1251_from_header() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=windows-1251")
                .set_body_bytes(windows_1251("<p>Зарегистрирован: 28 Дек 2023</p>")),
        )
        .mount(&server)
        .await;

    let fetcher = PageFetcher::new().expect("fetcher should build");
    let body = fetcher
        .fetch(&format!("{}/page", server.uri()))
        .await
        .expect("fetch should succeed");

    assert!(body.contains("Зарегистрирован: 28 Дек 2023"), "got: {body}");
}

#[tokio::test]
async fn test_fetch_decodes_windows_1251_from_meta_tag() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let html = r#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=windows-1251"></head><body>Сериал</body></html>"#;
    Mock::given(method("GET"))
        .and(path("/meta"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_bytes(windows_1251(html)),
        )
        .mount(&server)
        .await;

    let fetcher = PageFetcher::new().expect("fetcher should build");
    let body = fetcher
        .fetch(&format!("{}/meta", server.uri()))
        .await
        .expect("fetch should succeed");

    assert!(body.contains("Сериал"), "got: {body}");
}

#[tokio::test]
async fn test_fetch_non_success_status_is_http_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = PageFetcher::new().expect("fetcher should build");
    let error = fetcher
        .fetch(&format!("{}/broken", server.uri()))
        .await
        .expect_err("500 must fail");

    match error {
        FetchError::HttpStatus { status, .. } => assert!(status.starts_with("500"), "{status}"),
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_times_out_on_slow_server() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let fetcher = PageFetcher::with_timeouts(Duration::from_secs(1), Duration::from_millis(200))
        .expect("fetcher should build");
    let error = fetcher
        .fetch(&format!("{}/slow", server.uri()))
        .await
        .expect_err("slow response must time out");

    assert!(
        matches!(error, FetchError::Timeout { .. }),
        "expected Timeout, got {error:?}"
    );
}

#[tokio::test]
async fn test_parse_rutracker_topic() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let page = rutracker_topic(
        "Шоу / Show (2024) S01",
        "05-Мар-24 09:07",
        "magnet:?xt=urn:btih:AAAA1111",
    );
    Mock::given(method("GET"))
        .and(path("/rutracker/viewtopic.php"))
        .and(query_param("t", "6543210"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=windows-1251")
                .set_body_bytes(windows_1251(&page)),
        )
        .mount(&server)
        .await;

    let url = format!("{}/rutracker/viewtopic.php?t=6543210", server.uri());
    let metadata = parser_for(&server).parse(&url).await.expect("parse should succeed");

    assert_eq!(metadata.id, "6543210");
    assert_eq!(metadata.original_url, url);
    assert_eq!(metadata.magnet, "magnet:?xt=urn:btih:AAAA1111");
    assert_eq!(metadata.name, "Шоу / Show (2024) S01");
    assert_eq!(metadata.last_comment, "");
    assert_eq!(metadata.location, "");
    assert_eq!(
        metadata.torrent_updated_at,
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(9, 7, 0)
            .unwrap()
    );
    assert!(metadata.created_at.is_none());
    assert!(metadata.deleted_at.is_none());
}

#[tokio::test]
async fn test_parse_nnm_topic_reads_latest_comment() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let page = nnm_topic(
        "Сериал / Series (2023)",
        "28 Дек 2023 15:41:22",
        "magnet:?xt=urn:btih:BBBB2222",
        "rss.php?t=1001",
    );
    let feed = comment_feed(&[
        (
            r#"<span class="postbody">first comment</span>"#,
            "Mon, 01 Jan 2024 10:00:00 +0000",
        ),
        (
            r#"<div><b>uploader</b><span class="postbody">Episode 8 added</span></div>"#,
            "Tue, 02 Jan 2024 10:00:00 +0000",
        ),
    ]);
    Mock::given(method("GET"))
        .and(path("/nnm/viewtopic.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/nnm/rss.php"))
        .and(query_param("t", "1001"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml; charset=utf-8")
                .set_body_string(feed),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/nnm/viewtopic.php?t=1001", server.uri());
    let metadata = parser_for(&server).parse(&url).await.expect("parse should succeed");

    assert_eq!(metadata.id, "1001");
    assert_eq!(metadata.name, "Сериал / Series (2023)");
    assert_eq!(metadata.magnet, "magnet:?xt=urn:btih:BBBB2222");
    assert_eq!(metadata.last_comment, "Episode 8 added");
    assert_eq!(
        metadata.torrent_updated_at,
        NaiveDate::from_ymd_opt(2023, 12, 28)
            .unwrap()
            .and_hms_opt(15, 41, 22)
            .unwrap()
    );
}

#[tokio::test]
async fn test_parse_nnm_topic_survives_missing_feed() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let page = nnm_topic(
        "Title",
        "28 Дек 2023 15:41:22",
        "magnet:?xt=urn:btih:CCCC",
        "rss.php?t=7",
    );
    Mock::given(method("GET"))
        .and(path("/nnm/viewtopic.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/nnm/rss.php"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/nnm/viewtopic.php?t=7", server.uri());
    let metadata = parser_for(&server).parse(&url).await.expect("feed failure is not fatal");

    assert_eq!(metadata.id, "7");
    assert_eq!(metadata.last_comment, "");
}

#[tokio::test]
async fn test_parse_is_deterministic_except_sync_time() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let page = rutracker_topic("Stable", "01-Янв-24 00:00", "magnet:?xt=urn:btih:DDDD");
    Mock::given(method("GET"))
        .and(path("/rutracker/viewtopic.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;

    let parser = parser_for(&server);
    let url = format!("{}/rutracker/viewtopic.php?t=55", server.uri());
    let first = parser.parse(&url).await.expect("first parse");
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second = parser.parse(&url).await.expect("second parse");

    assert!(second.last_sync_at > first.last_sync_at);
    let mut second_aligned = second.clone();
    second_aligned.last_sync_at = first.last_sync_at;
    assert_eq!(first, second_aligned);
}

#[tokio::test]
async fn test_parse_unknown_tracker_makes_no_request() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let url = format!("{}/elsewhere/viewtopic.php?t=1", server.uri());
    let error = parser_for(&server)
        .parse(&url)
        .await
        .expect_err("unknown host must fail");

    match &error {
        TrackerError::ProviderNotFound { url: failed, .. } => assert_eq!(failed, &url),
        other => panic!("expected ProviderNotFound, got {other:?}"),
    }
    assert!(error.to_string().contains("provider not found"));
}

#[tokio::test]
async fn test_parse_propagates_page_fetch_failure() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/rutracker/viewtopic.php"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let url = format!("{}/rutracker/viewtopic.php?t=1", server.uri());
    let error = parser_for(&server)
        .parse(&url)
        .await
        .expect_err("503 must fail");

    assert!(
        matches!(error, TrackerError::Fetch(FetchError::HttpStatus { .. })),
        "got {error:?}"
    );
}

#[test]
fn test_default_registry_covers_known_trackers() {
    let registry = ProviderRegistry::with_defaults();
    assert!(
        registry
            .select("https://rutracker.org/forum/viewtopic.php?t=1")
            .is_ok()
    );
    assert!(
        registry
            .select("https://nnmclub.to/forum/viewtopic.php?t=1")
            .is_ok()
    );
    assert!(registry.select("https://example.com/t=1").is_err());
}
