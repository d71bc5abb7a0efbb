use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Image container formats accepted by the pipeline, identified by file
/// extension only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    WebP,
    Heif,
}

impl SourceFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(SourceFormat::Jpeg),
            "png" => Some(SourceFormat::Png),
            "webp" => Some(SourceFormat::WebP),
            "heic" => Some(SourceFormat::Heif),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Jpeg => "jpg",
            SourceFormat::Png => "png",
            SourceFormat::WebP => "webp",
            SourceFormat::Heif => "heic",
        }
    }

    /// Formats we prefer to trade away for a more compatible container when
    /// the caller asks for `auto` output.
    pub fn is_lossy_leaning(&self) -> bool {
        matches!(self, SourceFormat::Heif)
    }
}

/// How the output container is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputPolicy {
    /// Keep the input's format.
    #[default]
    Preserve,
    /// Prefer a JPEG container for lossy-leaning inputs (HEIC).
    Auto,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveOptions {
    #[serde(default)]
    pub output_format: OutputPolicy,
}

/// Auxiliary metadata lifted verbatim from the original file bytes. The
/// renderer never touches this; the encoder passes it through unmodified.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedMetadata {
    pub icc_profile: Option<Vec<u8>>,
    /// Raw EXIF payload as TIFF bytes (no APP1 wrapper).
    pub exif: Option<Vec<u8>>,
}

/// Which metadata field supplied the resolved capture date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateSource {
    DateTimeOriginal,
    DateTimeDigitized,
    DateTime,
    FileModifyDate,
}

impl DateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateSource::DateTimeOriginal => "DateTimeOriginal",
            DateSource::DateTimeDigitized => "DateTimeDigitized",
            DateSource::DateTime => "DateTime",
            DateSource::FileModifyDate => "FileModifyDate",
        }
    }
}

impl std::fmt::Display for DateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A capture timestamp plus the source it came from. EXIF datetimes carry no
/// timezone, so this stays naive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedDate {
    pub datetime: NaiveDateTime,
    pub source: DateSource,
}

/// Outcome of one `add_timestamp` invocation.
#[derive(Debug, Clone, Serialize)]
pub struct TimestampResult {
    /// Path actually written; may differ from the requested path when the
    /// target format forced an extension rewrite.
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub date_used: Option<NaiveDateTime>,
    pub date_source: Option<DateSource>,
    pub timestamp_added: bool,
}
