//! Lossless PNG export of a rendered composite.

use std::path::{Path, PathBuf};

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::compose::Composite;

/// Output encodings.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Lossless, keeps the alpha channel.
    #[default]
    Png,
}

impl ExportFormat {
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
        }
    }
}

/// Export failure.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The composite drew a cross-origin source and its pixels can't be
    /// read back.
    #[error("export blocked: the composite contains a cross-origin image")]
    Blocked,
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Encode RGBA8 pixels as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(out)
}

/// `combined-image-<timestamp_ms>.png`
pub fn export_filename(timestamp_ms: i64) -> String {
    format!("combined-image-{timestamp_ms}.{}", ExportFormat::Png.extension())
}

/// Export filename stamped with the current UTC time.
pub fn default_filename() -> String {
    export_filename(chrono::Utc::now().timestamp_millis())
}

impl Composite {
    /// Encode as PNG, unless the composite is tainted.
    pub fn export_png(&self) -> Result<Vec<u8>, ExportError> {
        self.export(ExportFormat::Png)
    }

    /// Encode in `format`, unless the composite is tainted.
    pub fn export(&self, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
        if self.is_tainted() {
            return Err(ExportError::Blocked);
        }
        let bytes = match format {
            ExportFormat::Png => encode_png(self.image())?,
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(format = format.mime(), bytes = bytes.len(), "composite exported");
        Ok(bytes)
    }
}

/// Write the composite as PNG into `dir` under a generated filename.
///
/// Returns the path written.
pub fn save_png(composite: &Composite, dir: &Path) -> Result<PathBuf, ExportError> {
    let bytes = composite.export_png()?;
    let path = dir.join(default_filename());
    std::fs::write(&path, bytes)?;
    Ok(path)
}
