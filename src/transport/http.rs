//! HTTP transport backed by `reqwest`

use super::Transport;
use crate::config::TransportConfig;
use crate::error::{Error, Result, TransportFailure};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use url::Url;

/// Issues `GET` requests with a shared [`reqwest::Client`] session
///
/// The client pools connections across every item of a run. Options from
/// [`TransportConfig`] (timeouts, headers, proxy, TLS) are applied when the
/// session is opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport;

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new() -> Self {
        Self
    }

    fn build_client(config: &TransportConfig) -> Result<Client> {
        let mut builder = Client::builder();

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        if !config.headers.is_empty() {
            builder = builder.default_headers(header_map(config)?);
        }
        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str()).map_err(|e| {
                Error::config("proxy", format!("invalid proxy URL '{proxy}': {e}"))
            })?;
            builder = builder.proxy(proxy);
        }
        if config.accept_invalid_certs {
            tracing::warn!("TLS certificate validation is disabled for this session");
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(max_idle) = config.pool_max_idle_per_host {
            builder = builder.pool_max_idle_per_host(max_idle);
        }

        Ok(builder.build()?)
    }
}

fn header_map(config: &TransportConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(config.headers.len());
    for (name, value) in &config.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::config("headers", format!("invalid header name '{name}': {e}")))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            Error::config("headers", format!("invalid value for header '{name}': {e}"))
        })?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

fn parse_locator(locator: &str) -> Result<Url> {
    let url = Url::parse(locator).map_err(|e| Error::InvalidLocator {
        locator: locator.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::InvalidLocator {
            locator: locator.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

fn classify_failure(err: &reqwest::Error) -> TransportFailure {
    if err.is_timeout() {
        TransportFailure::Timeout
    } else if err.is_connect() {
        TransportFailure::Connect
    } else {
        TransportFailure::Other
    }
}

#[async_trait]
impl Transport for HttpTransport {
    type Session = Client;
    type Response = Response;

    async fn open(&self, config: &TransportConfig) -> Result<Client> {
        Self::build_client(config)
    }

    async fn request(&self, session: &Client, locator: &str) -> Result<Response> {
        let url = parse_locator(locator)?;
        session
            .get(url)
            .send()
            .await
            .map_err(|e| Error::transport(locator, classify_failure(&e), e))
    }

    fn status(&self, response: &Response) -> StatusCode {
        response.status()
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
