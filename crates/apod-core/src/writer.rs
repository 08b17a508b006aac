use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};

/// Relative to the working directory, next to the display firmware's image folder.
pub const DEFAULT_OUTPUT: &str = "../image/apod.jpg";

/// Overwrite `path` with `data`, creating missing parent directories.
/// Not atomic: a killed process can leave a partial file.
pub fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, data).map_err(io_err)?;

    info!("Wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}
