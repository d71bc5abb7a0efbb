use image::{DynamicImage, ImageEncoder, codecs::jpeg::JpegEncoder};
use img_parts::{Bytes, ImageEXIF, jpeg::Jpeg};
use std::path::Path;
use tracing::debug;

use crate::stamp::error::StampError;
use crate::stamp::types::EmbeddedMetadata;

/// Extract the ICC profile from JPEG bytes.
///
/// ICC profiles live in APP2 segments carrying the `ICC_PROFILE` identifier.
pub fn extract_icc_profile(buffer: &[u8]) -> Option<Vec<u8>> {
    let mut pos = 0;
    while pos + 1 < buffer.len() {
        if buffer[pos] == 0xFF {
            let marker = buffer[pos + 1];
            if marker == 0xE2 {
                // APP2 marker
                if pos + 4 < buffer.len() {
                    let segment_length =
                        u16::from_be_bytes([buffer[pos + 2], buffer[pos + 3]]) as usize;
                    if pos + 2 + segment_length <= buffer.len() {
                        let segment_start = pos + 4;
                        let segment_end = pos + 2 + segment_length;
                        let segment_data = &buffer[segment_start..segment_end];

                        if segment_data.len() > 14 && segment_data.starts_with(b"ICC_PROFILE\0") {
                            // Profile data starts after the identifier and
                            // 2 chunk-sequence bytes.
                            let icc_data = &segment_data[14..];
                            if !icc_data.is_empty() {
                                debug!("found ICC profile in JPEG: {} bytes", icc_data.len());
                                return Some(icc_data.to_vec());
                            }
                        }
                        pos = segment_end;
                    } else {
                        pos += 2;
                    }
                } else {
                    pos += 2;
                }
            } else {
                pos += 2;
            }
        } else {
            pos += 1;
        }
    }

    None
}

/// Extract the raw EXIF payload (TIFF bytes) from JPEG bytes.
pub fn extract_exif(buffer: &[u8]) -> Option<Vec<u8>> {
    let jpeg = Jpeg::from_bytes(Bytes::copy_from_slice(buffer)).ok()?;
    jpeg.exif().map(|exif| exif.to_vec())
}

/// Encode as JPEG, carrying forward the ICC profile and EXIF payload when
/// present. The whole file is built in memory and written with a single
/// `fs::write`.
pub fn save(
    image: &DynamicImage,
    path: &Path,
    quality: u8,
    metadata: &EmbeddedMetadata,
) -> Result<(), StampError> {
    // JPEG doesn't support an alpha channel, so convert to RGB
    let rgb_image = image.to_rgb8();

    let mut encoded = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut encoded, quality);

    if let Some(profile) = &metadata.icc_profile {
        match encoder.set_icc_profile(profile.clone()) {
            Ok(()) => debug!("JPEG will carry ICC profile: {} bytes", profile.len()),
            Err(e) => debug!("JPEG encoder rejected ICC profile ({}), writing without it", e),
        }
    }

    encoder
        .write_image(
            &rgb_image,
            rgb_image.width(),
            rgb_image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| StampError::ImageWrite(e.to_string()))?;

    let encoded = match &metadata.exif {
        Some(exif) => attach_exif(encoded, exif),
        None => encoded,
    };

    std::fs::write(path, encoded)?;
    Ok(())
}

/// Re-attach an EXIF payload to freshly encoded JPEG bytes. Best effort: if
/// the container can't be re-opened the encoded bytes are kept as-is.
fn attach_exif(encoded: Vec<u8>, exif: &[u8]) -> Vec<u8> {
    let original = Bytes::from(encoded);
    match Jpeg::from_bytes(original.clone()) {
        Ok(mut jpeg) => {
            jpeg.set_exif(Some(Bytes::copy_from_slice(exif)));
            jpeg.encoder().bytes().to_vec()
        }
        Err(e) => {
            debug!("could not re-open encoded JPEG to attach EXIF: {}", e);
            original.to_vec()
        }
    }
}
