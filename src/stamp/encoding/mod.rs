// Encoding module - target format selection, per-format encoders, and the
// degrade-to-JPEG safety net
pub mod formats;

use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::error::StampError;
use super::types::{EmbeddedMetadata, OutputPolicy, SaveOptions, SourceFormat};

const JPEG_QUALITY: u8 = 95;
const WEBP_QUALITY: f32 = 95.0;
#[cfg(feature = "heif")]
const HEIF_QUALITY: u8 = 90;

/// Pull the auxiliary metadata bag (ICC profile, raw EXIF payload) out of
/// the original file bytes. Never fails; a format we can't pick apart just
/// yields an empty bag.
pub fn extract_embedded(bytes: &[u8], format: SourceFormat) -> EmbeddedMetadata {
    match format {
        SourceFormat::Jpeg => EmbeddedMetadata {
            icc_profile: formats::jpeg::extract_icc_profile(bytes),
            exif: formats::jpeg::extract_exif(bytes),
        },
        SourceFormat::Png => EmbeddedMetadata {
            icc_profile: formats::png::extract_icc_profile(bytes),
            exif: formats::png::extract_exif(bytes),
        },
        SourceFormat::WebP => EmbeddedMetadata {
            icc_profile: formats::webp::extract_icc_profile(bytes),
            exif: formats::webp::extract_exif(bytes),
        },
        // The HEIC decoder surfaces the ICC profile itself.
        SourceFormat::Heif => EmbeddedMetadata::default(),
    }
}

/// Write the image in the best available format.
///
/// The target format follows the input's extension, except that `auto`
/// output demotes lossy-leaning inputs to JPEG. The output path's extension
/// is rewritten whenever it doesn't already spell the target format. If the
/// chosen encoder fails, the result is re-encoded exactly once as a plain
/// JPEG with no carried-forward metadata.
pub fn save(
    image: &DynamicImage,
    metadata: &EmbeddedMetadata,
    input_format: SourceFormat,
    requested_path: &Path,
    options: &SaveOptions,
) -> Result<PathBuf, StampError> {
    if let Some(parent) = requested_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let target = determine_target_format(input_format, options);
    let output_path = align_extension(requested_path, target);

    match encode(image, metadata, target, &output_path) {
        Ok(()) => Ok(output_path),
        Err(e) => {
            warn!(
                "{} encode failed ({}), falling back to plain JPEG",
                target.extension(),
                e
            );
            let fallback_path = output_path.with_extension("jpg");
            match formats::jpeg::save(image, &fallback_path, JPEG_QUALITY, &EmbeddedMetadata::default()) {
                Ok(()) => {
                    if fallback_path != output_path {
                        // A failed encoder may have left a partial file.
                        let _ = std::fs::remove_file(&output_path);
                    }
                    Ok(fallback_path)
                }
                Err(fallback_error) => {
                    let _ = std::fs::remove_file(&output_path);
                    let _ = std::fs::remove_file(&fallback_path);
                    Err(fallback_error)
                }
            }
        }
    }
}

fn determine_target_format(input_format: SourceFormat, options: &SaveOptions) -> SourceFormat {
    if options.output_format == OutputPolicy::Auto && input_format.is_lossy_leaning() {
        SourceFormat::Jpeg
    } else {
        input_format
    }
}

/// Rewrite the requested path's extension unless it already names the target
/// format (so a requested `.jpeg` survives a Jpeg target).
fn align_extension(requested: &Path, target: SourceFormat) -> PathBuf {
    let requested_format = requested
        .extension()
        .and_then(|e| e.to_str())
        .and_then(SourceFormat::from_extension);

    if requested_format == Some(target) {
        requested.to_path_buf()
    } else {
        requested.with_extension(target.extension())
    }
}

fn encode(
    image: &DynamicImage,
    metadata: &EmbeddedMetadata,
    target: SourceFormat,
    path: &Path,
) -> Result<(), StampError> {
    match target {
        SourceFormat::Jpeg => formats::jpeg::save(image, path, JPEG_QUALITY, metadata),
        SourceFormat::Png => formats::png::save(image, path, metadata),
        SourceFormat::WebP => formats::webp::save(image, path, WEBP_QUALITY),
        #[cfg(feature = "heif")]
        SourceFormat::Heif => formats::heif::save(image, path, HEIF_QUALITY),
        #[cfg(not(feature = "heif"))]
        SourceFormat::Heif => Err(StampError::ImageWrite(
            "HEIC support is not enabled in this build".to_string(),
        )),
    }
}
