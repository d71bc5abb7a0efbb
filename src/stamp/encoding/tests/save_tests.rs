use crate::stamp::encoding::{formats, save};
use crate::stamp::types::{EmbeddedMetadata, OutputPolicy, SaveOptions, SourceFormat};
use image::{DynamicImage, Rgb, RgbImage};
use tempfile::TempDir;

fn test_image() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(60, 45, Rgb([120, 130, 140])))
}

#[cfg(not(feature = "heif"))]
#[test]
fn failed_heic_encode_degrades_to_jpeg() {
    let dir = TempDir::new().unwrap();
    let requested = dir.path().join("shot.heic");

    // Without the heif feature the HEIC encoder always fails, which drives
    // the one-shot JPEG fallback.
    let written = save(
        &test_image(),
        &EmbeddedMetadata::default(),
        SourceFormat::Heif,
        &requested,
        &SaveOptions::default(),
    )
    .unwrap();

    assert_eq!(written, dir.path().join("shot.jpg"));
    assert!(written.exists());
    assert!(!requested.exists());

    let decoded = image::open(&written).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (60, 45));
}

#[cfg(not(feature = "heif"))]
#[test]
fn fallback_jpeg_drops_carried_metadata() {
    let dir = TempDir::new().unwrap();
    let metadata = EmbeddedMetadata {
        icc_profile: Some(vec![1, 2, 3, 4]),
        exif: Some(b"II\x2a\x00\x08\x00\x00\x00x".to_vec()),
    };

    let written = save(
        &test_image(),
        &metadata,
        SourceFormat::Heif,
        &dir.path().join("shot.heic"),
        &SaveOptions::default(),
    )
    .unwrap();

    let bytes = std::fs::read(&written).unwrap();
    assert!(formats::jpeg::extract_icc_profile(&bytes).is_none());
    assert!(formats::jpeg::extract_exif(&bytes).is_none());
}

#[test]
fn auto_routes_heic_input_through_the_jpeg_encoder() {
    let dir = TempDir::new().unwrap();
    let payload = b"II\x2a\x00\x08\x00\x00\x00heic-exif".to_vec();
    let metadata = EmbeddedMetadata {
        icc_profile: None,
        exif: Some(payload.clone()),
    };
    let options = SaveOptions {
        output_format: OutputPolicy::Auto,
    };

    // No HEIC encode happens on this path, so it works in every build, and
    // the metadata bag is carried because the real target is JPEG.
    let written = save(
        &test_image(),
        &metadata,
        SourceFormat::Heif,
        &dir.path().join("shot.heic"),
        &options,
    )
    .unwrap();

    assert_eq!(written, dir.path().join("shot.jpg"));
    let bytes = std::fs::read(&written).unwrap();
    assert_eq!(formats::jpeg::extract_exif(&bytes), Some(payload));
}

#[test]
fn webp_output_is_decodable() {
    let dir = TempDir::new().unwrap();
    let written = save(
        &test_image(),
        &EmbeddedMetadata::default(),
        SourceFormat::WebP,
        &dir.path().join("shot.webp"),
        &SaveOptions::default(),
    )
    .unwrap();

    assert_eq!(written, dir.path().join("shot.webp"));
    let decoded = image::open(&written).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (60, 45));
}

#[test]
fn webp_extraction_finds_nothing_in_plain_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plain.webp");
    formats::webp::save(&test_image(), &path, 95.0).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(formats::webp::extract_icc_profile(&bytes).is_none());
    assert!(formats::webp::extract_exif(&bytes).is_none());
    assert!(formats::webp::extract_exif(b"not a webp").is_none());
}

#[test]
fn parent_directories_are_created_recursively() {
    let dir = TempDir::new().unwrap();
    let requested = dir.path().join("a/b/c/out.png");

    let written = save(
        &test_image(),
        &EmbeddedMetadata::default(),
        SourceFormat::Png,
        &requested,
        &SaveOptions::default(),
    )
    .unwrap();

    assert_eq!(written, requested);
    assert!(written.exists());
}
