pub mod encoding;
pub mod error;
pub mod metadata;
pub mod types;

pub use error::StampError;
pub use types::{
    DateSource, EmbeddedMetadata, OutputPolicy, ResolvedDate, SaveOptions, SourceFormat,
    TimestampResult,
};

use crate::overlay;
use image::DynamicImage;
use std::path::Path;
use tracing::debug;

/// Stamp the capture date onto a photo and write the result.
///
/// The date comes from embedded metadata when available, with the file
/// modification time as the final fallback; when no date can be determined
/// at all, the image is re-encoded without an overlay. The output keeps the
/// input's format unless `options` asks for `auto` output on a lossy-leaning
/// input.
pub fn add_timestamp(
    input_path: &Path,
    output_path: &Path,
    options: &SaveOptions,
) -> Result<TimestampResult, StampError> {
    let format = validate_format(input_path)?;
    let (image, embedded) = load_image(input_path, format)?;
    let resolved = metadata::resolve_date(input_path);

    let image = match resolved {
        Some(date) => overlay::render_timestamp(&image, date.datetime),
        None => {
            debug!("no date for {}, skipping overlay", input_path.display());
            image
        }
    };

    let written = encoding::save(&image, &embedded, format, output_path, options)?;

    Ok(TimestampResult {
        output_path: written,
        width: image.width(),
        height: image.height(),
        date_used: resolved.map(|r| r.datetime),
        date_source: resolved.map(|r| r.source),
        timestamp_added: resolved.is_some(),
    })
}

/// Extension check only. Runs before any file I/O and never sniffs content.
fn validate_format(path: &Path) -> Result<SourceFormat, StampError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    SourceFormat::from_extension(extension)
        .ok_or_else(|| StampError::UnsupportedFormat(extension.to_ascii_lowercase()))
}

/// Read and decode the input, lifting the auxiliary metadata bag out of the
/// original bytes so the encoder can carry it forward.
fn load_image(
    path: &Path,
    format: SourceFormat,
) -> Result<(DynamicImage, EmbeddedMetadata), StampError> {
    let bytes = std::fs::read(path).map_err(|e| StampError::ImageRead(e.to_string()))?;

    match format {
        #[cfg(feature = "heif")]
        SourceFormat::Heif => encoding::formats::heif::decode(&bytes),
        #[cfg(not(feature = "heif"))]
        SourceFormat::Heif => Err(StampError::ImageRead(
            "HEIC support is not enabled in this build".to_string(),
        )),
        _ => {
            let image =
                image::load_from_memory(&bytes).map_err(|e| StampError::ImageRead(e.to_string()))?;
            let embedded = encoding::extract_embedded(&bytes, format);
            Ok((image, embedded))
        }
    }
}
