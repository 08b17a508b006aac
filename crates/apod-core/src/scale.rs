use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};
use tracing::debug;

use crate::error::{Error, Result};

/// Bounding box the output must fit inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    /// Native resolution of the 320x240 TFT display.
    pub const DISPLAY: Bounds = Bounds {
        width: 320,
        height: 240,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Target size for an `iw` x `ih` source.
    ///
    /// Square sources become `min(width, height)` on both sides. Otherwise
    /// the longer side is pinned to the box and the other is truncated from
    /// `(box / long) * short` in f64.
    pub fn fit(&self, iw: u32, ih: u32) -> Result<(u32, u32)> {
        let (sw, sh) = (self.width, self.height);
        let (w, h) = if iw == ih {
            let side = sw.min(sh);
            (side, side)
        } else if iw > ih {
            (sw, ((sw as f64 / iw as f64) * ih as f64) as u32)
        } else {
            (((sh as f64 / ih as f64) * iw as f64) as u32, sh)
        };

        if w == 0 || h == 0 {
            return Err(Error::InvalidDimensions {
                width: iw,
                height: ih,
                bounds_width: sw,
                bounds_height: sh,
            });
        }
        Ok((w, h))
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::DISPLAY
    }
}

/// Decode any supported still-image format, sniffed from the bytes.
pub fn decode(data: &[u8]) -> Result<DynamicImage> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| Error::Decode(image::ImageError::IoError(e)))?
        .decode()
        .map_err(Error::Decode)
}

/// Lanczos3 resample to exactly the fitted size.
pub fn scale_to_fit(img: &DynamicImage, bounds: Bounds) -> Result<DynamicImage> {
    let (iw, ih) = img.dimensions();
    let (w, h) = bounds.fit(iw, ih)?;
    debug!("scaling {}x{} -> {}x{}", iw, ih, w, h);
    Ok(img.resize_exact(w, h, FilterType::Lanczos3))
}
