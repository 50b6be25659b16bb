//! End-to-end tests for the HTTP transport against a mock server
//!
//! Each test starts a `wiremock` server, points items at it and checks which
//! handler saw which response.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use batch_fetch::{
    BaseUrl, Error, FetchConfig, HandlerError, HttpTransport, Orchestrator, ResponseHandler,
    SpawnStrategy, TransportConfig, TransportFailure,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// What a handler saw: (item, status, body)
type Seen = Arc<Mutex<Vec<(String, u16, String)>>>;

#[derive(Clone, Default)]
struct Collect {
    seen: Seen,
}

#[async_trait]
impl ResponseHandler<String, reqwest::Response> for Collect {
    async fn handle(&self, response: reqwest::Response, item: &String) -> Result<(), HandlerError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        self.seen.lock().unwrap().push((item.clone(), status, body));
        Ok(())
    }
}

impl Collect {
    fn seen(&self) -> Vec<(String, u16, String)> {
        self.seen.lock().unwrap().clone()
    }
}

fn orchestrator(cap: usize) -> (Orchestrator<HttpTransport, String>, Collect, Collect) {
    let success = Collect::default();
    let failure = Collect::default();
    let orchestrator = Orchestrator::new(
        FetchConfig::with_max_concurrent_requests(cap),
        HttpTransport::new(),
        success.clone(),
        failure.clone(),
    )
    .unwrap();
    (orchestrator, success, failure)
}

/// Address on localhost where nothing is listening
async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/unreachable")
}

#[tokio::test]
async fn ok_response_goes_to_success_handler_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let (orchestrator, success, failure) = orchestrator(2);
    let url = format!("{}/ok", server.uri());

    let summary = orchestrator
        .orchestrate(vec![url.clone()], &TransportConfig::default())
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(success.seen(), vec![(url, 200, "ok".to_string())]);
    assert!(failure.seen().is_empty());
}

#[tokio::test]
async fn not_found_goes_to_failure_handler_with_original_item() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such thing"))
        .mount(&server)
        .await;

    let (orchestrator, success, failure) = orchestrator(2);
    let url = format!("{}/missing", server.uri());

    let summary = orchestrator
        .orchestrate(vec![url.clone()], &TransportConfig::default())
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert!(success.seen().is_empty());
    assert_eq!(failure.seen(), vec![(url, 404, "no such thing".to_string())]);
}

#[tokio::test]
async fn server_error_goes_to_failure_handler() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let (orchestrator, success, failure) = orchestrator(2);

    orchestrator
        .orchestrate(
            vec![format!("{}/flaky", server.uri())],
            &TransportConfig::default(),
        )
        .await
        .unwrap();

    // Attempted exactly once: no retries.
    assert!(success.seen().is_empty());
    assert_eq!(failure.seen().len(), 1);
    assert_eq!(failure.seen()[0].1, 503);
}

#[tokio::test]
async fn unreachable_locator_propagates_without_dispatch() {
    let (orchestrator, success, failure) = orchestrator(2);
    let url = closed_port_url().await;

    let err = orchestrator
        .orchestrate(vec![url.clone()], &TransportConfig::default())
        .await
        .unwrap_err();

    match err {
        Error::Transport { locator, kind, .. } => {
            assert_eq!(locator, url);
            assert_eq!(kind, TransportFailure::Connect);
        }
        other => panic!("expected Transport error, got {other:?}"),
    }
    assert!(success.seen().is_empty());
    assert!(failure.seen().is_empty());
}

#[tokio::test]
async fn unreachable_item_does_not_stop_the_others() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fine"))
        .mount(&server)
        .await;

    let (orchestrator, success, _failure) = orchestrator(1);
    let mut urls = vec![closed_port_url().await];
    urls.extend((0..3).map(|i| format!("{}/after/{i}", server.uri())));

    let err = orchestrator
        .orchestrate(urls, &TransportConfig::default())
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert_eq!(success.seen().len(), 3);
}

#[tokio::test]
async fn request_timeout_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let (orchestrator, success, failure) = orchestrator(2);
    let config = TransportConfig {
        timeout: Some(Duration::from_millis(200)),
        ..Default::default()
    };

    let err = orchestrator
        .orchestrate(vec![format!("{}/slow", server.uri())], &config)
        .await
        .unwrap_err();

    match err {
        Error::Transport { kind, .. } => assert_eq!(kind, TransportFailure::Timeout),
        other => panic!("expected Transport timeout, got {other:?}"),
    }
    assert!(success.seen().is_empty());
    assert!(failure.seen().is_empty());
}

#[tokio::test]
async fn session_sends_configured_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("x-api-key", "secret"))
        .and(header("user-agent", "batch-fetch-tests"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (orchestrator, success, failure) = orchestrator(2);
    let mut config = TransportConfig {
        user_agent: Some("batch-fetch-tests".to_string()),
        ..Default::default()
    };
    config
        .headers
        .insert("X-Api-Key".to_string(), "secret".to_string());

    let urls: Vec<_> = (0..3).map(|i| format!("{}/h/{i}", server.uri())).collect();
    orchestrator.orchestrate(urls, &config).await.unwrap();

    // Unmatched requests get a 404 from wiremock and would land in `failure`.
    assert_eq!(success.seen().len(), 3);
    assert!(failure.seen().is_empty());
}

#[tokio::test]
async fn cap_limits_throughput_against_real_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(200)))
        .expect(6)
        .mount(&server)
        .await;

    let (orchestrator, success, _failure) = orchestrator(2);
    let urls: Vec<_> = (0..6).map(|i| format!("{}/w/{i}", server.uri())).collect();

    let started = Instant::now();
    orchestrator
        .orchestrate(urls, &TransportConfig::default())
        .await
        .unwrap();

    // Six 200ms requests two at a time need at least three rounds.
    assert!(
        started.elapsed() >= Duration::from_millis(550),
        "finished too fast for cap 2: {:?}",
        started.elapsed()
    );
    assert_eq!(success.seen().len(), 6);
}

#[tokio::test]
async fn base_url_resolver_with_bounded_strategy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/a.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("A"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/b.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("B"))
        .mount(&server)
        .await;

    let success = Collect::default();
    let failure = Collect::default();
    let orchestrator = Orchestrator::new(
        FetchConfig {
            max_concurrent_requests: 2,
            strategy: SpawnStrategy::Bounded,
        },
        HttpTransport::new(),
        success.clone(),
        failure.clone(),
    )
    .unwrap()
    .with_resolver(BaseUrl::new(format!("{}/files", server.uri())));

    let items = vec!["a.txt".to_string(), "b.txt".to_string(), "c.txt".to_string()];
    let summary = orchestrator
        .orchestrate(items, &TransportConfig::default())
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    let mut seen = success.seen();
    seen.sort();
    assert_eq!(
        seen,
        vec![
            ("a.txt".to_string(), 200, "A".to_string()),
            ("b.txt".to_string(), 200, "B".to_string()),
        ]
    );
    assert_eq!(failure.seen()[0].0, "c.txt");
}

#[tokio::test]
async fn invalid_locator_is_reported_per_item() {
    let (orchestrator, success, failure) = orchestrator(2);

    let err = orchestrator
        .orchestrate(vec!["not a url".to_string()], &TransportConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidLocator { .. }), "got {err:?}");
    assert!(success.seen().is_empty());
    assert!(failure.seen().is_empty());
}
