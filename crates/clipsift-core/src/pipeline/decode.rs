//! Image decoding with content-based format detection and size limits.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Image decoder with configurable limits.
///
/// Decoding is synchronous: it runs on the run's worker thread, never on the
/// interaction side.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Original file size in bytes
    pub file_size: u64,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Read and decode the image at `path`, enforcing file size and dimension limits.
    pub fn decode(&self, path: &Path) -> Result<DecodedImage, PipelineError> {
        let metadata = std::fs::metadata(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read metadata: {}", e),
        })?;

        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let bytes = std::fs::read(path).map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot read file: {}", e),
        })?;

        let decoded = Self::decode_bytes(bytes, path)?;

        if decoded.width > self.limits.max_image_dimension
            || decoded.height > self.limits.max_image_dimension
        {
            return Err(PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                width: decoded.width,
                height: decoded.height,
                max_dim: self.limits.max_image_dimension,
            });
        }

        Ok(decoded)
    }

    /// Decode an in-memory buffer. The format is sniffed from the content,
    /// falling back to the file extension.
    fn decode_bytes(bytes: Vec<u8>, path: &Path) -> Result<DecodedImage, PipelineError> {
        use std::io::Cursor;

        let file_size = bytes.len() as u64;
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Cannot detect image format: {}", e),
            })?;
        let format = match reader.format() {
            Some(f) => f,
            None => ImageFormat::from_path(path).map_err(|_| PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            })?,
        };
        let image = reader.decode().map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        Ok(DecodedImage {
            image,
            format,
            width,
            height,
            file_size,
        })
    }
}
