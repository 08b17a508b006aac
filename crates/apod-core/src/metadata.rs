use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result, Stage};
use crate::http::{redact, HttpClient};

pub const DEFAULT_API_URL: &str = "https://api.nasa.gov/planetary/apod";

/// The `media_type` discriminant of an APOD entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum MediaType {
    Image,
    Video,
    Other(String),
}

impl From<String> for MediaType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "image" => MediaType::Image,
            "video" => MediaType::Video,
            _ => MediaType::Other(s),
        }
    }
}

impl MediaType {
    pub fn as_str(&self) -> &str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Other(s) => s,
        }
    }
}

/// APOD API response. Only `media_type` is required up front; the URL
/// fields are checked when the asset URL is selected.
#[derive(Debug, Clone, Deserialize)]
pub struct ApodMetadata {
    pub media_type: MediaType,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
}

impl ApodMetadata {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(Error::MalformedMetadata)
    }

    /// Image entries use `url`, videos use `thumbnail_url`.
    pub fn asset_url(&self) -> Result<&str> {
        match &self.media_type {
            MediaType::Image => self.url.as_deref().ok_or(Error::MissingField("url")),
            MediaType::Video => self
                .thumbnail_url
                .as_deref()
                .ok_or(Error::MissingField("thumbnail_url")),
            MediaType::Other(other) => Err(Error::UnsupportedMediaType(other.clone())),
        }
    }
}

/// Metadata request URL: `api_key` then `thumbs=True`.
/// A missing key is sent empty; the API rejects it with a non-200.
pub fn request_url(api_url: &str, api_key: Option<&str>) -> Result<String> {
    let url = reqwest::Url::parse_with_params(
        api_url,
        &[("api_key", api_key.unwrap_or_default()), ("thumbs", "True")],
    )
    .map_err(|e| Error::transport(api_url, e))?;
    Ok(url.into())
}

/// GET the metadata document. The body is only parsed on HTTP 200.
pub fn fetch_metadata(client: &impl HttpClient, url: &str) -> Result<ApodMetadata> {
    debug!("fetching metadata from {}", redact(url));
    let resp = client.get(url)?;
    if resp.status != 200 {
        return Err(Error::HttpStatus {
            stage: Stage::Metadata,
            status: resp.status,
        });
    }

    let metadata = ApodMetadata::from_slice(&resp.body)?;
    info!(
        "APOD {} {}: {}",
        metadata.date.as_deref().unwrap_or("(no date)"),
        metadata.media_type.as_str(),
        metadata.title.as_deref().unwrap_or("(untitled)")
    );
    if let Some(copyright) = &metadata.copyright {
        info!("Copyright: {}", copyright.trim());
    }
    Ok(metadata)
}
