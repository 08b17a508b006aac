use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};

/// Status and body of a completed GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Synchronous GET. Any HTTP status is a response; only transport
/// failures (DNS, TLS, connection, timeout) are errors.
pub trait HttpClient {
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// `HttpClient` backed by `reqwest::blocking`.
pub struct BlockingClient {
    client: reqwest::blocking::Client,
}

impl BlockingClient {
    /// Build a client. With `timeout = None` reqwest's default applies.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(concat!("apod-thumb/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::transport("<client builder>", e))?;
        Ok(Self { client })
    }
}

impl HttpClient for BlockingClient {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        // reqwest errors carry the full URL, api_key included
        let transport = |e: reqwest::Error| Error::transport(redact(url), e.without_url());
        let resp = self.client.get(url).send().map_err(transport)?;
        let status = resp.status().as_u16();
        let body = resp.bytes().map_err(transport)?;
        debug!("GET {} status={} bytes={}", redact(url), status, body.len());
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

/// Replace the `api_key` query value so URLs can be logged.
pub(crate) fn redact(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(mut parsed) if parsed.query_pairs().any(|(k, _)| k == "api_key") => {
            let pairs: Vec<(String, String)> = parsed
                .query_pairs()
                .map(|(k, v)| {
                    let v = if k == "api_key" { "***".into() } else { v.into_owned() };
                    (k.into_owned(), v)
                })
                .collect();
            parsed.query_pairs_mut().clear().extend_pairs(pairs);
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}
