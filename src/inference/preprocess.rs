//! Image preprocessing for inference
//!
//! Decodes an image, resizes it to the model's input size, and scales
//! pixel values into `[0, 1]`. The checkpoint was trained on inputs
//! scaled by 1/255 with no further normalization, so none is applied
//! here.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage};

use crate::utils::error::{LeafscanError, Result};

/// Resize an image to the target square dimensions
pub fn resize_image(image: &DynamicImage, size: u32) -> DynamicImage {
    image.resize_exact(size, size, FilterType::Triangle)
}

/// Convert an image to a flat vector of `[0, 1]` floats.
/// Returns CHW layout: [C, H, W] flattened.
pub fn to_chw_floats(image: &DynamicImage) -> Vec<f32> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let num_pixels = (width * height) as usize;

    // Pre-allocate for CHW layout
    let mut scaled = vec![0.0f32; 3 * num_pixels];

    for (i, pixel) in rgb.pixels().enumerate() {
        // CHW layout: all R values, then all G values, then all B values
        scaled[i] = pixel[0] as f32 / 255.0;
        scaled[num_pixels + i] = pixel[1] as f32 / 255.0;
        scaled[2 * num_pixels + i] = pixel[2] as f32 / 255.0;
    }

    scaled
}

/// Resize and scale an already-decoded image
pub fn prepare_image(image: &DynamicImage, size: u32) -> Vec<f32> {
    let resized = resize_image(image, size);
    to_chw_floats(&resized)
}

/// Load an image from a file path and prepare it for inference
pub fn prepare_file(path: &Path, size: u32) -> Result<Vec<f32>> {
    let image = image::open(path)
        .map_err(|e| LeafscanError::ImageLoad(path.to_path_buf(), e.to_string()))?;
    Ok(prepare_image(&image, size))
}

/// Decode an image from raw bytes and prepare it for inference
pub fn prepare_bytes(bytes: &[u8], size: u32) -> Result<Vec<f32>> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| LeafscanError::ImageDecode(e.to_string()))?;
    Ok(prepare_image(&image, size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize() {
        let img = DynamicImage::new_rgb8(100, 50);
        let resized = resize_image(&img, 224);
        assert_eq!(resized.width(), 224);
        assert_eq!(resized.height(), 224);
    }

    #[test]
    fn test_chw_layout_and_scaling() {
        let mut rgb = image::RgbImage::new(2, 2);
        for pixel in rgb.pixels_mut() {
            *pixel = image::Rgb([255, 0, 51]);
        }
        let img = DynamicImage::ImageRgb8(rgb);

        let floats = to_chw_floats(&img);
        // CHW: 3 channels * 2 * 2
        assert_eq!(floats.len(), 12);
        // Red channel first
        assert!((floats[0] - 1.0).abs() < 1e-6);
        // Then green
        assert!(floats[4].abs() < 1e-6);
        // Then blue
        assert!((floats[8] - 0.2).abs() < 1e-3);
    }

    #[test]
    fn test_prepare_image_len() {
        let img = DynamicImage::new_rgb8(30, 40);
        let floats = prepare_image(&img, 224);
        assert_eq!(floats.len(), 3 * 224 * 224);
    }

    #[test]
    fn test_prepare_bytes_rejects_garbage() {
        let err = prepare_bytes(b"definitely not an image", 224);
        assert!(err.is_err());
    }
}
