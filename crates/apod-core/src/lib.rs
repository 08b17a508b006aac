pub mod download;
pub mod encode;
pub mod error;
pub mod http;
pub mod metadata;
pub mod scale;
pub mod writer;

use std::path::PathBuf;

use image::GenericImageView;
use tracing::{info, warn};

pub use error::{Error, ErrorKind, Result, Stage};
pub use http::{BlockingClient, HttpClient, HttpResponse};
pub use metadata::{ApodMetadata, MediaType, DEFAULT_API_URL};
pub use scale::Bounds;
pub use writer::DEFAULT_OUTPUT;

#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Sent as-is; `None` goes out as an empty `api_key`.
    pub api_key: Option<String>,
    pub api_url: String,
    pub output: PathBuf,
    pub bounds: Bounds,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            bounds: Bounds::DISPLAY,
        }
    }
}

/// Encoded output of one run, before it is written anywhere.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub data: Vec<u8>,
    pub media_type: MediaType,
    pub asset_url: String,
    pub source_size: (u32, u32),
    pub size: (u32, u32),
}

#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub output: PathBuf,
    pub media_type: MediaType,
    pub asset_url: String,
    pub source_size: (u32, u32),
    pub size: (u32, u32),
    pub bytes_written: u64,
}

/// Type alias for progress callback
pub type ProgressCallback<'a> = dyn Fn(&str, u64, u64, &str) + 'a;

const TOTAL_STAGES: u64 = 5;

/// Fetch today's entry and return the resized baseline JPEG, using the
/// default API endpoint and the 320x240 display box.
pub fn produce_thumbnail(api_key: Option<&str>, client: &impl HttpClient) -> Result<Thumbnail> {
    let options = ProcessOptions {
        api_key: api_key.map(str::to_string),
        ..ProcessOptions::default()
    };
    produce_thumbnail_with(&options, client, &|_, _, _, _| {})
}

/// Metadata, asset selection, download, decode, resize and encode.
/// Nothing is written to disk.
pub fn produce_thumbnail_with(
    options: &ProcessOptions,
    client: &impl HttpClient,
    progress: &ProgressCallback<'_>,
) -> Result<Thumbnail> {
    if options.api_key.as_deref().map_or(true, str::is_empty) {
        warn!("no API key set; the APOD API will most likely reject the request");
    }

    // Stage 1: metadata + asset selection
    progress("metadata", 0, TOTAL_STAGES, "Contacting APOD API");
    let url = metadata::request_url(&options.api_url, options.api_key.as_deref())?;
    let meta = metadata::fetch_metadata(client, &url)?;
    let asset_url = meta.asset_url()?.to_string();

    // Stage 2: download
    progress("download", 1, TOTAL_STAGES, &asset_url);
    let bytes = download::download_asset(client, &asset_url)?;

    // Stage 3: decode + resize
    progress("scale", 2, TOTAL_STAGES, "Resizing");
    let img = scale::decode(&bytes)?;
    let source_size = img.dimensions();
    let resized = scale::scale_to_fit(&img, options.bounds)?;
    let size = resized.dimensions();

    // Stage 4: encode
    progress("encode", 3, TOTAL_STAGES, "Encoding baseline JPEG");
    let data = encode::encode_baseline_jpeg(&resized)?;

    info!(
        "{} {}x{} -> {}x{} ({} bytes)",
        meta.media_type.as_str(),
        source_size.0,
        source_size.1,
        size.0,
        size.1,
        data.len()
    );

    Ok(Thumbnail {
        data,
        media_type: meta.media_type,
        asset_url,
        source_size,
        size,
    })
}

/// Run the full pipeline and write the result to `options.output`.
/// The file is only touched once every earlier stage has succeeded.
pub fn process(
    options: &ProcessOptions,
    client: &impl HttpClient,
    progress: &ProgressCallback<'_>,
) -> Result<ProcessResult> {
    let thumb = produce_thumbnail_with(options, client, progress)?;

    // Stage 5: write
    progress("write", 4, TOTAL_STAGES, &options.output.display().to_string());
    writer::write_output(&options.output, &thumb.data)?;

    Ok(ProcessResult {
        output: options.output.clone(),
        media_type: thumb.media_type,
        asset_url: thumb.asset_url,
        source_size: thumb.source_size,
        size: thumb.size,
        bytes_written: thumb.data.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, RgbImage};
    use tempfile::tempdir;

    const API: &str = "http://apod.test/planetary/apod";

    /// Canned responses keyed by URL; unknown URLs fail as transport errors.
    #[derive(Default)]
    struct FakeClient {
        responses: HashMap<String, HttpResponse>,
        requests: RefCell<Vec<String>>,
    }

    impl FakeClient {
        fn with(mut self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
            self.responses
                .insert(url.to_string(), HttpResponse::new(status, body));
            self
        }

        fn with_metadata(self, status: u16, body: &str) -> Self {
            let url = metadata::request_url(API, Some("KEY")).unwrap();
            self.with(&url, status, body)
        }

        fn requests(&self) -> Vec<String> {
            self.requests.borrow().clone()
        }
    }

    impl HttpClient for FakeClient {
        fn get(&self, url: &str) -> Result<HttpResponse> {
            self.requests.borrow_mut().push(url.to_string());
            self.responses.get(url).cloned().ok_or_else(|| {
                Error::transport(
                    url,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no canned response"),
                )
            })
        }
    }

    fn options(output: PathBuf) -> ProcessOptions {
        ProcessOptions {
            api_key: Some("KEY".to_string()),
            api_url: API.to_string(),
            output,
            bounds: Bounds::DISPLAY,
        }
    }

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn noop(_: &str, _: u64, _: u64, _: &str) {}

    #[test]
    fn test_end_to_end_image() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("image").join("apod.jpg");
        let client = FakeClient::default()
            .with_metadata(200, r#"{"media_type":"image","url":"http://x/img.jpg","title":"M31"}"#)
            .with("http://x/img.jpg", 200, encoded(400, 200, ImageFormat::Jpeg));

        let result = process(&options(out.clone()), &client, &noop).unwrap();
        assert_eq!(result.media_type, MediaType::Image);
        assert_eq!(result.asset_url, "http://x/img.jpg");
        assert_eq!(result.source_size, (400, 200));
        assert_eq!(result.size, (320, 160));

        let written = std::fs::read(&out).unwrap();
        assert_eq!(written.len() as u64, result.bytes_written);
        assert_eq!(encode::tests::sof_marker(&written), Some(0xC0));
        let decoded = image::load_from_memory(&written).unwrap();
        assert_eq!(decoded.dimensions(), (320, 160));
    }

    #[test]
    fn test_video_downloads_thumbnail() {
        let client = FakeClient::default()
            .with_metadata(
                200,
                r#"{"media_type":"video","url":"https://www.youtube.com/embed/abc","thumbnail_url":"http://x/thumb.png"}"#,
            )
            .with("http://x/thumb.png", 200, encoded(480, 360, ImageFormat::Png));

        let dir = tempdir().unwrap();
        let thumb =
            produce_thumbnail_with(&options(dir.path().join("apod.jpg")), &client, &noop).unwrap();
        assert_eq!(thumb.media_type, MediaType::Video);
        assert_eq!(thumb.asset_url, "http://x/thumb.png");
        assert_eq!(thumb.size, (320, 240));
        assert_eq!(client.requests()[1], "http://x/thumb.png");
    }

    #[test]
    fn test_square_image_uses_smaller_side() {
        let client = FakeClient::default()
            .with_metadata(200, r#"{"media_type":"image","url":"http://x/sq.png"}"#)
            .with("http://x/sq.png", 200, encoded(500, 500, ImageFormat::Png));

        let dir = tempdir().unwrap();
        let thumb =
            produce_thumbnail_with(&options(dir.path().join("apod.jpg")), &client, &noop).unwrap();
        assert_eq!(thumb.size, (240, 240));
    }

    #[test]
    fn test_other_media_type_skips_download() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("apod.jpg");
        let client = FakeClient::default().with_metadata(200, r#"{"media_type":"other"}"#);

        let err = process(&options(out.clone()), &client, &noop).unwrap_err();
        assert!(matches!(err, Error::UnsupportedMediaType(_)));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(client.requests().len(), 1);
        assert!(!out.exists());
    }

    #[test]
    fn test_metadata_404_is_not_parsed() {
        let client = FakeClient::default().with_metadata(404, "not json at all");

        let err = produce_thumbnail_with(&options(PathBuf::from("unused.jpg")), &client, &noop)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::HttpStatus {
                stage: Stage::Metadata,
                status: 404
            }
        ));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(client.requests().len(), 1);
    }

    #[test]
    fn test_asset_500_writes_nothing() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("apod.jpg");
        let client = FakeClient::default()
            .with_metadata(200, r#"{"media_type":"image","url":"http://x/img.jpg"}"#)
            .with("http://x/img.jpg", 500, "boom");

        let err = process(&options(out.clone()), &client, &noop).unwrap_err();
        assert!(matches!(
            err,
            Error::HttpStatus {
                stage: Stage::Asset,
                status: 500
            }
        ));
        assert_eq!(err.exit_code(), 1);
        assert!(!out.exists());
    }

    #[test]
    fn test_non_200_success_codes_are_rejected() {
        let client = FakeClient::default().with_metadata(204, "");
        let err = produce_thumbnail_with(&options(PathBuf::from("unused.jpg")), &client, &noop)
            .unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 204, .. }));
    }

    #[test]
    fn test_malformed_metadata_is_unexpected() {
        let client = FakeClient::default().with_metadata(200, r#"{"url":"http://x/img.jpg"}"#);
        let err = produce_thumbnail_with(&options(PathBuf::from("unused.jpg")), &client, &noop)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedMetadata(_)));
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert_eq!(err.exit_code(), 2);

        let client = FakeClient::default().with_metadata(200, r#"{"media_type":"image"}"#);
        let err = produce_thumbnail_with(&options(PathBuf::from("unused.jpg")), &client, &noop)
            .unwrap_err();
        assert!(matches!(err, Error::MissingField("url")));
        assert_eq!(client.requests().len(), 1);
    }

    #[test]
    fn test_undecodable_asset_is_unexpected() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("apod.jpg");
        let client = FakeClient::default()
            .with_metadata(200, r#"{"media_type":"image","url":"http://x/img.jpg"}"#)
            .with("http://x/img.jpg", 200, "<html>not an image</html>");

        let err = process(&options(out.clone()), &client, &noop).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert_eq!(err.exit_code(), 2);
        assert!(!out.exists());
    }

    #[test]
    fn test_progress_reports_stages_in_order() {
        let dir = tempdir().unwrap();
        let client = FakeClient::default()
            .with_metadata(200, r#"{"media_type":"image","url":"http://x/img.jpg"}"#)
            .with("http://x/img.jpg", 200, encoded(64, 48, ImageFormat::Jpeg));

        let stages = RefCell::new(Vec::new());
        process(&options(dir.path().join("apod.jpg")), &client, &|stage, current, total, _| {
            assert_eq!(total, TOTAL_STAGES);
            stages.borrow_mut().push((stage.to_string(), current));
        })
        .unwrap();

        let stages = stages.into_inner();
        let names: Vec<&str> = stages.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(names, ["metadata", "download", "scale", "encode", "write"]);
        assert!(stages.iter().enumerate().all(|(i, (_, c))| *c == i as u64));
    }

    #[test]
    fn test_produce_thumbnail_uses_default_endpoint() {
        let url = metadata::request_url(DEFAULT_API_URL, Some("KEY")).unwrap();
        let client = FakeClient::default()
            .with(&url, 200, r#"{"media_type":"image","url":"http://x/img.jpg"}"#)
            .with("http://x/img.jpg", 200, encoded(200, 400, ImageFormat::Png));

        let thumb = produce_thumbnail(Some("KEY"), &client).unwrap();
        assert_eq!(thumb.size, (120, 240));
        assert_eq!(client.requests()[0], url);
    }
}
