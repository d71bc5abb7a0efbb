use flate2::read::ZlibDecoder;
use image::{DynamicImage, codecs::png::PngEncoder};
use img_parts::{Bytes, ImageEXIF, ImageICC, png::Png};
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::stamp::error::StampError;
use crate::stamp::types::EmbeddedMetadata;

/// Extract the ICC profile from PNG bytes (iCCP chunk).
pub fn extract_icc_profile(buffer: &[u8]) -> Option<Vec<u8>> {
    // PNG signature check
    if buffer.len() < 8 || &buffer[0..8] != b"\x89PNG\r\n\x1a\n" {
        return None;
    }

    let mut pos = 8; // Skip PNG signature

    while pos + 12 <= buffer.len() {
        // Chunk length (4 bytes, big-endian)
        let chunk_length = u32::from_be_bytes([
            buffer[pos],
            buffer[pos + 1],
            buffer[pos + 2],
            buffer[pos + 3],
        ]) as usize;

        let chunk_type = &buffer[pos + 4..pos + 8];

        if chunk_type == b"iCCP" {
            let chunk_data_start = pos + 8;
            let chunk_data_end = chunk_data_start + chunk_length;

            if chunk_data_end <= buffer.len() {
                let chunk_data = &buffer[chunk_data_start..chunk_data_end];

                // iCCP chunk format:
                // - Profile name (null-terminated string)
                // - Compression method (1 byte, 0 = deflate)
                // - Compressed profile data
                if let Some(null_pos) = chunk_data.iter().position(|&b| b == 0)
                    && null_pos + 2 < chunk_data.len()
                {
                    let compression_method = chunk_data[null_pos + 1];

                    if compression_method == 0 {
                        let compressed_data = &chunk_data[null_pos + 2..];

                        let mut decoder = ZlibDecoder::new(compressed_data);
                        let mut decompressed = Vec::new();

                        if decoder.read_to_end(&mut decompressed).is_ok() {
                            debug!(
                                "found ICC profile in PNG: {} bytes (decompressed)",
                                decompressed.len()
                            );
                            return Some(decompressed);
                        }
                    }
                }
            }
        }

        // Next chunk (length + type + data + CRC)
        pos += 8 + chunk_length + 4;

        if chunk_type == b"IEND" {
            break;
        }
    }

    None
}

/// Extract the raw EXIF payload (TIFF bytes) from PNG bytes (eXIf chunk).
pub fn extract_exif(buffer: &[u8]) -> Option<Vec<u8>> {
    let png = Png::from_bytes(Bytes::copy_from_slice(buffer)).ok()?;
    png.exif().map(|exif| exif.to_vec())
}

/// Encode as PNG at full fidelity, keeping the input's color mode, with the
/// ICC profile and EXIF payload re-attached where present.
pub fn save(image: &DynamicImage, path: &Path, metadata: &EmbeddedMetadata) -> Result<(), StampError> {
    let mut encoded = Vec::new();
    let encoder = PngEncoder::new(&mut encoded);
    image
        .write_with_encoder(encoder)
        .map_err(|e| StampError::ImageWrite(e.to_string()))?;

    let encoded = attach_metadata(encoded, metadata);

    std::fs::write(path, encoded)?;
    Ok(())
}

/// Re-attach ICC and EXIF to freshly encoded PNG bytes. Best effort.
fn attach_metadata(encoded: Vec<u8>, metadata: &EmbeddedMetadata) -> Vec<u8> {
    if metadata.icc_profile.is_none() && metadata.exif.is_none() {
        return encoded;
    }

    let original = Bytes::from(encoded);
    match Png::from_bytes(original.clone()) {
        Ok(mut png) => {
            if let Some(profile) = &metadata.icc_profile {
                png.set_icc_profile(Some(Bytes::copy_from_slice(profile)));
                debug!("PNG will carry ICC profile: {} bytes", profile.len());
            }
            if let Some(exif) = &metadata.exif {
                png.set_exif(Some(Bytes::copy_from_slice(exif)));
            }
            png.encoder().bytes().to_vec()
        }
        Err(e) => {
            debug!("could not re-open encoded PNG to attach metadata: {}", e);
            original.to_vec()
        }
    }
}
