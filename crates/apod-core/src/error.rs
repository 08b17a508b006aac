use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

/// Which of the two HTTP requests a status error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Metadata,
    Asset,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Metadata => f.write_str("metadata request"),
            Stage::Asset => f.write_str("asset download"),
        }
    }
}

/// Failure classes. `Handled` are the ones the pipeline diagnoses
/// explicitly; everything else is `Unexpected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Handled,
    Unexpected,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{stage} returned HTTP {status}")]
    HttpStatus { stage: Stage, status: u16 },

    #[error("unsupported media type {0:?}")]
    UnsupportedMediaType(String),

    #[error("malformed metadata")]
    MalformedMetadata(#[source] serde_json::Error),

    #[error("metadata has no {0:?} field")]
    MissingField(&'static str),

    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("failed to decode image")]
    Decode(#[source] image::ImageError),

    #[error("cannot fit {width}x{height} into {bounds_width}x{bounds_height}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        bounds_width: u32,
        bounds_height: u32,
    },

    #[error("failed to encode JPEG")]
    Encode(#[source] image::ImageError),

    #[error("failed to write {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    #[must_use]
    pub fn transport<E>(url: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Transport {
            url: url.into(),
            source: Box::new(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::HttpStatus { .. } | Error::UnsupportedMediaType(_) => ErrorKind::Handled,
            _ => ErrorKind::Unexpected,
        }
    }

    /// Process exit code for this failure: 1 for handled, 2 for unexpected.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Handled => 1,
            ErrorKind::Unexpected => 2,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
