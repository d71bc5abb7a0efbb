use crate::stamp::encoding::formats::png;
use crate::stamp::types::EmbeddedMetadata;
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use tempfile::TempDir;

fn test_profile() -> Vec<u8> {
    (0..=255u8).rev().cycle().take(320).collect()
}

#[test]
fn save_carries_icc_and_exif_forward() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tagged.png");
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 40, Rgba([9, 8, 7, 255])));
    let profile = test_profile();
    let payload = b"II\x2a\x00\x08\x00\x00\x00png-exif".to_vec();
    let metadata = EmbeddedMetadata {
        icc_profile: Some(profile.clone()),
        exif: Some(payload.clone()),
    };

    png::save(&image, &path, &metadata).unwrap();

    let written = std::fs::read(&path).unwrap();
    // The iCCP chunk is zlib-compressed on the way in and decompressed by
    // the extractor, so the bytes must round-trip exactly.
    assert_eq!(png::extract_icc_profile(&written), Some(profile));
    assert_eq!(png::extract_exif(&written), Some(payload));
}

#[test]
fn save_is_lossless() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("exact.png");

    let mut source = RgbaImage::new(31, 17);
    for (x, y, pixel) in source.enumerate_pixels_mut() {
        *pixel = Rgba([x as u8, y as u8, (x * y) as u8, 255 - x as u8]);
    }
    let image = DynamicImage::ImageRgba8(source.clone());

    png::save(&image, &path, &EmbeddedMetadata::default()).unwrap();

    let decoded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(decoded.as_raw(), source.as_raw());
}

#[test]
fn grayscale_mode_survives_the_container() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gray.png");
    let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(25, 25, Luma([77])));

    png::save(&image, &path, &EmbeddedMetadata::default()).unwrap();

    let decoded = image::open(&path).unwrap();
    assert!(matches!(decoded, DynamicImage::ImageLuma8(_)));
}

#[test]
fn extraction_tolerates_foreign_and_broken_input() {
    assert!(png::extract_icc_profile(&[]).is_none());
    assert!(png::extract_icc_profile(b"\x89PNG\r\n\x1a\n").is_none());
    assert!(png::extract_icc_profile(b"not a png at all").is_none());
    assert!(png::extract_exif(b"not a png at all").is_none());

    // A clean PNG simply has no profile to find.
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clean.png");
    GrayImage::from_pixel(10, 10, Luma([0])).save(&path).unwrap();
    let written = std::fs::read(&path).unwrap();
    assert!(png::extract_icc_profile(&written).is_none());
    assert!(png::extract_exif(&written).is_none());
}
