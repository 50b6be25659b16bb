//! Fetch example
//!
//! This example demonstrates the core functionality of batch-fetch:
//! - Configuring the concurrency cap and transport options
//! - Writing success and failure handlers
//! - Mapping custom items to URLs
//! - Inspecting the run summary and per-item errors
//!
//! Run with: cargo run --example fetch_urls -- https://example.com/ https://example.com/missing

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use batch_fetch::{
    Error, FetchConfig, HandlerError, HttpTransport, Orchestrator, ResponseHandler,
    TransportConfig,
};

/// A page to fetch, labelled for reporting
struct Page {
    label: String,
    url: String,
}

/// Counts body bytes of successful responses
struct CountBytes {
    total: Arc<AtomicU64>,
}

#[async_trait::async_trait]
impl ResponseHandler<Page, reqwest::Response> for CountBytes {
    async fn handle(&self, response: reqwest::Response, page: &Page) -> Result<(), HandlerError> {
        let body = response.bytes().await?;
        self.total.fetch_add(body.len() as u64, Ordering::Relaxed);
        println!("[ok]   {} ({} bytes)", page.label, body.len());
        Ok(())
    }
}

/// Reports failed responses
struct ReportFailure;

#[async_trait::async_trait]
impl ResponseHandler<Page, reqwest::Response> for ReportFailure {
    async fn handle(&self, response: reqwest::Response, page: &Page) -> Result<(), HandlerError> {
        println!("[fail] {} -> {}", page.label, response.status());
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        eprintln!("usage: fetch_urls <url>...");
        return Ok(());
    }

    let pages: Vec<Page> = urls
        .into_iter()
        .enumerate()
        .map(|(i, url)| Page {
            label: format!("page-{i}"),
            url,
        })
        .collect();

    let total = Arc::new(AtomicU64::new(0));
    let orchestrator = Orchestrator::new(
        FetchConfig::with_max_concurrent_requests(4),
        HttpTransport::new(),
        CountBytes {
            total: Arc::clone(&total),
        },
        ReportFailure,
    )?
    .with_resolver(|page: &Page| page.url.clone());

    let transport_config = TransportConfig {
        timeout: Some(Duration::from_secs(30)),
        user_agent: Some("batch-fetch-demo/0.1".to_string()),
        ..Default::default()
    };

    match orchestrator.orchestrate(pages, &transport_config).await {
        Ok(summary) => println!(
            "{} succeeded, {} failed in {:?}",
            summary.succeeded, summary.failed, summary.elapsed
        ),
        Err(Error::Batch { failed, errors, .. }) => {
            println!("{failed} items could not be fetched:");
            for err in errors {
                println!("  {err}");
            }
        }
        Err(err) => println!("fetch error: {err}"),
    }

    println!("downloaded {} bytes", total.load(Ordering::Relaxed));
    Ok(())
}
