use super::types::{DateSource, ResolvedDate};
use chrono::NaiveDateTime;
use std::path::Path;
use tracing::{debug, trace};

/// EXIF datetime values are fixed-format ASCII: "2005:07:30 07:22:46".
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

type Extractor = fn(&Path) -> Option<ResolvedDate>;

/// Tried strictly in order; the first extractor that produces a parseable
/// date wins. The two EXIF readers are deliberately separate parsers with
/// different failure surfaces, not a refactoring opportunity.
const EXTRACTORS: &[Extractor] = &[
    extract_from_rexif,
    extract_from_exif_reader,
    extract_from_mtime,
];

/// Best-available capture date for the file, or `None` when even the
/// modification time cannot be read. Never fails: decode and I/O problems
/// in any one source just move resolution on to the next one.
pub fn resolve_date(path: &Path) -> Option<ResolvedDate> {
    for extract in EXTRACTORS {
        if let Some(resolved) = extract(path) {
            debug!(
                "resolved date {} from {} for {}",
                resolved.datetime,
                resolved.source,
                path.display()
            );
            return Some(resolved);
        }
    }

    trace!("no date available for {}", path.display());
    None
}

/// Primary reader: rexif's full tag table, which covers both IFD0 and the
/// nested Exif sub-IFD in one scan.
fn extract_from_rexif(path: &Path) -> Option<ResolvedDate> {
    let exif_data = match rexif::parse_file(path) {
        Ok(data) => data,
        Err(e) => {
            trace!("rexif could not parse {}: {}", path.display(), e);
            return None;
        }
    };

    let date_fields = [
        (rexif::ExifTag::DateTimeOriginal, DateSource::DateTimeOriginal),
        (rexif::ExifTag::DateTimeDigitized, DateSource::DateTimeDigitized),
        (rexif::ExifTag::DateTime, DateSource::DateTime),
    ];

    for (tag, source) in &date_fields {
        if let Some(entry) = exif_data.entries.iter().find(|e| e.tag == *tag)
            && let Some(datetime) = parse_exif_datetime(&entry.value_more_readable)
        {
            return Some(ResolvedDate {
                datetime,
                source: *source,
            });
        }
    }

    None
}

/// Secondary reader: an independent re-parse of the EXIF container. Some
/// files fail one parser but not the other.
fn extract_from_exif_reader(path: &Path) -> Option<ResolvedDate> {
    let file = std::fs::File::open(path).ok()?;
    let mut reader = std::io::BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;

    let date_fields = [
        (exif::Tag::DateTimeOriginal, DateSource::DateTimeOriginal),
        (exif::Tag::DateTimeDigitized, DateSource::DateTimeDigitized),
    ];

    for (tag, source) in &date_fields {
        let Some(field) = exif.get_field(*tag, exif::In::PRIMARY) else {
            continue;
        };
        // Take the raw ASCII value rather than the display form, which
        // reformats the separators.
        if let exif::Value::Ascii(ref values) = field.value
            && let Some(bytes) = values.first()
            && let Some(datetime) = parse_exif_datetime(&String::from_utf8_lossy(bytes))
        {
            return Some(ResolvedDate {
                datetime,
                source: *source,
            });
        }
    }

    None
}

/// Last resort: the file system's modification time, in local time.
fn extract_from_mtime(path: &Path) -> Option<ResolvedDate> {
    let mtime = std::fs::metadata(path).ok()?.modified().ok()?;
    let datetime: chrono::DateTime<chrono::Local> = mtime.into();
    Some(ResolvedDate {
        datetime: datetime.naive_local(),
        source: DateSource::FileModifyDate,
    })
}

/// Strict parse of an EXIF datetime string. Trailing NULs and surrounding
/// whitespace are stripped; anything that then fails the exact format is
/// treated as absent.
fn parse_exif_datetime(raw: &str) -> Option<NaiveDateTime> {
    let cleaned = raw.trim().trim_end_matches('\0').trim();
    NaiveDateTime::parse_from_str(cleaned, EXIF_DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_canonical_exif_datetime() {
        let dt = parse_exif_datetime("2024:06:15 14:30:00").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 6, 15));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (14, 30, 0));
    }

    #[test]
    fn strips_padding_before_parsing() {
        assert!(parse_exif_datetime("  2024:06:15 14:30:00\0\0").is_some());
        assert!(parse_exif_datetime("2024:06:15 14:30:00 \0").is_some());
    }

    #[test]
    fn rejects_non_canonical_formats() {
        assert!(parse_exif_datetime("").is_none());
        assert!(parse_exif_datetime("\0").is_none());
        assert!(parse_exif_datetime("2024-06-15 14:30:00").is_none());
        assert!(parse_exif_datetime("2024:06:15").is_none());
        assert!(parse_exif_datetime("not a date").is_none());
        assert!(parse_exif_datetime("2024:13:99 25:61:61").is_none());
    }

    #[test]
    fn missing_file_resolves_to_none() {
        assert!(resolve_date(std::path::Path::new("/nonexistent/image.jpg")).is_none());
    }

    #[test]
    fn unreadable_metadata_falls_through_to_mtime() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("garbage.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let resolved = resolve_date(&path).unwrap();
        assert_eq!(resolved.source, DateSource::FileModifyDate);

        let mtime = std::fs::metadata(&path).unwrap().modified().unwrap();
        let expected: chrono::DateTime<chrono::Local> = mtime.into();
        assert_eq!(resolved.datetime, expected.naive_local());
    }
}
