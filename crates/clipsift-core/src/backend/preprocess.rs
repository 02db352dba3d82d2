//! Image preprocessing for the CLIP vision encoder.
//!
//! CLIP ViT-B/32 expects:
//! - Shortest side resized to 224, then a 224×224 center crop
//! - Channel order: RGB
//! - Normalization: per-channel (pixel/255 - mean) / std with CLIP's statistics
//! - Tensor layout: NCHW [batch, channels, height, width]

use image::{DynamicImage, GenericImageView};
use ndarray::Array4;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// CLIP normalization mean (per-channel).
const NORM_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// CLIP normalization std (per-channel).
const NORM_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// Preprocess an image for CLIP inference.
pub fn preprocess(image: &DynamicImage, image_size: u32) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let short_side = width.min(height).max(1) as f32;
    let scale = image_size as f32 / short_side;
    let new_w = ((width as f32 * scale).round() as u32).max(image_size);
    let new_h = ((height as f32 * scale).round() as u32).max(image_size);

    let resized = image.resize_exact(new_w, new_h, image::imageops::FilterType::CatmullRom);
    let crop_x = (new_w - image_size) / 2;
    let crop_y = (new_h - image_size) / 2;
    let rgb = resized
        .crop_imm(crop_x, crop_y, image_size, image_size)
        .to_rgb8();

    let size = image_size as usize;
    let plane = size * size;
    let mut data = vec![0f32; CHANNELS * plane];

    for (i, pixel) in rgb.as_raw().chunks_exact(CHANNELS).enumerate() {
        for (c, &val) in pixel.iter().enumerate() {
            data[c * plane + i] = (val as f32 / 255.0 - NORM_MEAN[c]) / NORM_STD[c];
        }
    }

    // Length matches the shape by construction.
    Array4::from_shape_vec((1, CHANNELS, size, size), data)
        .unwrap_or_else(|_| Array4::zeros((1, CHANNELS, size, size)))
}
