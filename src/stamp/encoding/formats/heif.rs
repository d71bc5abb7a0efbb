use image::{DynamicImage, RgbImage};
use libheif_rs::{Channel, ColorSpace, CompressionFormat, EncoderQuality, HeifContext, LibHeif, RgbChroma};
use std::path::Path;
use tracing::debug;

use crate::stamp::error::StampError;
use crate::stamp::types::EmbeddedMetadata;

/// Decode HEIC bytes to an 8-bit RGB image, pulling the ICC profile from the
/// primary image handle along the way.
pub fn decode(bytes: &[u8]) -> Result<(DynamicImage, EmbeddedMetadata), StampError> {
    let lib_heif = LibHeif::new();
    let context =
        HeifContext::read_from_bytes(bytes).map_err(|e| StampError::ImageRead(e.to_string()))?;
    let handle = context
        .primary_image_handle()
        .map_err(|e| StampError::ImageRead(e.to_string()))?;

    let icc_profile = handle.color_profile_raw().map(|profile| {
        debug!("found ICC profile in HEIC: {} bytes", profile.data.len());
        profile.data
    });

    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(|e| StampError::ImageRead(e.to_string()))?;

    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| StampError::ImageRead("HEIC decode produced no pixel plane".to_string()))?;

    let width = plane.width;
    let height = plane.height;
    let row_bytes = width as usize * 3;

    // Rows are stride-aligned; repack them tightly.
    let mut data = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * plane.stride;
        data.extend_from_slice(&plane.data[start..start + row_bytes]);
    }

    let buffer = RgbImage::from_raw(width, height, data)
        .ok_or_else(|| StampError::ImageRead("HEIC plane has unexpected size".to_string()))?;

    Ok((
        DynamicImage::ImageRgb8(buffer),
        EmbeddedMetadata {
            icc_profile,
            exif: None,
        },
    ))
}

/// Encode as HEVC-compressed HEIF.
pub fn save(image: &DynamicImage, path: &Path, quality: u8) -> Result<(), StampError> {
    let rgb_image = image.to_rgb8();
    let (width, height) = rgb_image.dimensions();
    let row_bytes = width as usize * 3;

    let mut heif_image = libheif_rs::Image::new(width, height, ColorSpace::Rgb(RgbChroma::Rgb))
        .map_err(|e| StampError::ImageWrite(e.to_string()))?;
    heif_image
        .create_plane(Channel::Interleaved, width, height, 8)
        .map_err(|e| StampError::ImageWrite(e.to_string()))?;

    {
        let planes = heif_image.planes_mut();
        let plane = planes
            .interleaved
            .ok_or_else(|| StampError::ImageWrite("HEIC image has no pixel plane".to_string()))?;
        let stride = plane.stride;
        for (row, pixels) in rgb_image.as_raw().chunks_exact(row_bytes).enumerate() {
            let start = row * stride;
            plane.data[start..start + row_bytes].copy_from_slice(pixels);
        }
    }

    let lib_heif = LibHeif::new();
    let mut context = HeifContext::new().map_err(|e| StampError::ImageWrite(e.to_string()))?;
    let mut encoder = lib_heif
        .encoder_for_format(CompressionFormat::Hevc)
        .map_err(|e| StampError::ImageWrite(e.to_string()))?;
    encoder
        .set_quality(EncoderQuality::Lossy(quality))
        .map_err(|e| StampError::ImageWrite(e.to_string()))?;
    context
        .encode_image(&heif_image, &mut encoder, None)
        .map_err(|e| StampError::ImageWrite(e.to_string()))?;
    context
        .write_to_file(&path.to_string_lossy())
        .map_err(|e| StampError::ImageWrite(e.to_string()))?;

    Ok(())
}
