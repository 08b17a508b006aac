use tracing::debug;

use crate::error::{Error, Result, Stage};
use crate::http::HttpClient;

/// Download the raw image bytes.
pub fn download_asset(client: &impl HttpClient, url: &str) -> Result<Vec<u8>> {
    debug!("downloading asset {}", url);
    let resp = client.get(url)?;
    if resp.status != 200 {
        return Err(Error::HttpStatus {
            stage: Stage::Asset,
            status: resp.status,
        });
    }
    debug!("downloaded {} bytes", resp.body.len());
    Ok(resp.body)
}
