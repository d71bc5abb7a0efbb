use image::DynamicImage;
use img_parts::{Bytes, ImageEXIF, ImageICC, webp::WebP};
use std::path::Path;

use crate::stamp::error::StampError;

/// Extract the ICC profile from WebP bytes (ICCP chunk).
pub fn extract_icc_profile(buffer: &[u8]) -> Option<Vec<u8>> {
    let webp = WebP::from_bytes(Bytes::copy_from_slice(buffer)).ok()?;
    webp.icc_profile().map(|profile| profile.to_vec())
}

/// Extract the raw EXIF payload (TIFF bytes) from WebP bytes.
pub fn extract_exif(buffer: &[u8]) -> Option<Vec<u8>> {
    let webp = WebP::from_bytes(Bytes::copy_from_slice(buffer)).ok()?;
    webp.exif().map(|exif| exif.to_vec())
}

/// Encode as WebP. Pixels only: the plain encoder emits no VP8X header, so
/// metadata chunks can't be attached to its output reliably.
pub fn save(image: &DynamicImage, path: &Path, quality: f32) -> Result<(), StampError> {
    let rgb_image = image.to_rgb8();
    let (width, height) = rgb_image.dimensions();
    let rgb_data = rgb_image.into_raw();

    let encoder = webp::Encoder::from_rgb(&rgb_data, width, height);
    let encoded = encoder.encode(quality);
    std::fs::write(path, &*encoded)?;
    Ok(())
}
