// src/services/image_processor.rs
use image::{GenericImageView, ImageFormat};
use log::debug;

use crate::errors::LeafscanError;
use crate::models::StagedFile;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_DIMENSION: u32 = 4096;
pub const MAX_UPLOAD_EDGE: u32 = 2048;

/// Validates and, when necessary, downscales a selected image before it is
/// staged for upload. The server enforces the same 10MB/image-type limits;
/// checking here keeps doomed uploads off the wire.
pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn prepare_upload(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<StagedFile, LeafscanError> {
        if data.is_empty() {
            return Err(LeafscanError::ImageProcessing(
                "Selected file is empty".to_string(),
            ));
        }
        if !content_type.starts_with("image/") {
            return Err(LeafscanError::ImageProcessing(
                "File must be an image".to_string(),
            ));
        }
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(LeafscanError::ImageProcessing(
                "File size too large (max 10MB)".to_string(),
            ));
        }

        let img = image::load_from_memory(&data)
            .map_err(|e| LeafscanError::ImageProcessing(format!("Invalid image format: {e}")))?;
        let (width, height) = img.dimensions();
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(LeafscanError::ImageProcessing(
                "Image dimensions exceed 4096x4096".to_string(),
            ));
        }

        if width <= MAX_UPLOAD_EDGE && height <= MAX_UPLOAD_EDGE {
            return Ok(StagedFile::new(filename, content_type, data));
        }

        let ratio = MAX_UPLOAD_EDGE as f32 / width.max(height) as f32;
        let new_width = ((width as f32 * ratio) as u32).max(1);
        let new_height = ((height as f32 * ratio) as u32).max(1);
        debug!("downscaling {filename} from {width}x{height} to {new_width}x{new_height}");

        let resized = img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3);
        let mut output = Vec::new();
        resized
            .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Jpeg)
            .map_err(|e| {
                LeafscanError::ImageProcessing(format!("Failed to encode resized image: {e}"))
            })?;

        Ok(StagedFile::new(filename, "image/jpeg", output))
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}
