use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType};

use crate::error::{Error, Result};

/// Same default quality as PIL's JPEG writer.
pub const JPEG_QUALITY: u8 = 75;

/// Encode as a baseline (SOF0) JPEG. Some display drivers cannot decode
/// progressive JPEGs, and `JpegEncoder` only writes baseline frames.
pub fn encode_baseline_jpeg(img: &DynamicImage) -> Result<Vec<u8>> {
    // JPEG has no alpha channel
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(Error::Encode)?;
    Ok(buf)
}
