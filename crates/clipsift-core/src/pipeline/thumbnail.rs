//! Gallery thumbnails.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use crate::config::ThumbnailConfig;

/// Generates small WebP thumbnails for gallery rendering.
pub struct ThumbnailGenerator {
    config: ThumbnailConfig,
}

impl ThumbnailGenerator {
    /// Create a new thumbnail generator with the given configuration.
    pub fn new(config: ThumbnailConfig) -> Self {
        Self { config }
    }

    /// Generate a thumbnail and return it as a base64-encoded WebP string.
    ///
    /// Returns `None` if thumbnail generation is disabled or fails.
    pub fn generate(&self, image: &DynamicImage) -> Option<String> {
        self.generate_bytes(image)
            .map(|bytes| BASE64.encode(bytes))
    }

    /// Generate a thumbnail and return the raw WebP bytes.
    pub fn generate_bytes(&self, image: &DynamicImage) -> Option<Vec<u8>> {
        if !self.config.enabled {
            return None;
        }

        // Longest edge = config.size, aspect ratio kept
        let thumbnail = image.thumbnail(self.config.size, self.config.size);

        let mut buffer = Cursor::new(Vec::new());
        if let Err(e) = thumbnail.write_to(&mut buffer, ImageFormat::WebP) {
            tracing::debug!("Thumbnail encoding failed: {e}");
            return None;
        }

        Some(buffer.into_inner())
    }

    /// Check if thumbnail generation is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}
