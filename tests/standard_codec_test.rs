//! End-to-end runs through the real codec stack

mod common;

use std::fs;
use std::io::Cursor;
use std::sync::Arc;

use common::write_file;
use heic2jpg::{
    pipeline, CancelToken, ColorMode, EncodeSettings, ImageCodec, ProgressReporter, RunConfig,
    StandardCodec,
};
use image::metadata::Orientation;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

fn png_bytes(image: DynamicImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn jpeg_bytes(pixels: &RgbImage, exif_blob: Option<&[u8]>, icc: Option<&[u8]>) -> Vec<u8> {
    let settings = EncodeSettings::from(&heic2jpg::ConversionConfig::default());
    StandardCodec::new()
        .encode(pixels, exif_blob, icc, &settings)
        .unwrap()
}

/// Little-endian TIFF with a single orientation entry
fn tiff_orientation(value: u16) -> Vec<u8> {
    let mut tiff = b"II".to_vec();
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&value.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff
}

fn run(root: &std::path::Path, mode: ColorMode) -> heic2jpg::RunSummary {
    let config = RunConfig::builder()
        .add_root(root.to_path_buf())
        .num_workers(2)
        .quality(90)
        .color_mode(mode)
        .build();
    pipeline::run(
        &config,
        Arc::new(StandardCodec::new()),
        CancelToken::new(),
        &ProgressReporter::disabled(),
    )
    .unwrap()
}

#[test]
fn test_mixed_batch_with_real_codec() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    let codec = StandardCodec::new();
    let srgb = codec.standard_profile().unwrap();

    let pixels = RgbImage::from_fn(16, 8, |x, y| Rgb([(x * 15) as u8, (y * 30) as u8, 120]));
    write_file(&root, "a.heic", &png_bytes(DynamicImage::ImageRgb8(pixels.clone())));
    write_file(&root, "b.heic", &jpeg_bytes(&pixels, None, Some(&srgb)));
    write_file(&root, "c.heic", b"\x00\x01 definitely not an image");

    let summary = run(&root, ColorMode::ConvertToStandard);
    assert_eq!(summary.stats.converted, 2);
    assert_eq!(summary.stats.failed, 1);
    assert_eq!(summary.exit_code(), 2);

    for name in ["a", "b"] {
        assert!(!root.join(format!("{}.heic", name)).exists());
        let decoded = codec.decode(&fs::read(root.join(format!("{}.jpg", name))).unwrap()).unwrap();
        assert_eq!(decoded.pixels.width(), 16);
        assert_eq!(decoded.pixels.height(), 8);
        assert_eq!(decoded.icc_profile.as_deref(), Some(srgb.as_slice()));
    }
    assert!(root.join("c.heic").exists());
    assert!(!root.join("c.jpg").exists());
}

#[test]
fn test_corrupt_profile_falls_back_to_source_profile() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    let bogus = b"this is not a real icc profile".to_vec();
    let pixels = RgbImage::from_pixel(8, 8, Rgb([40, 80, 160]));
    write_file(&root, "a.heic", &jpeg_bytes(&pixels, None, Some(&bogus)));

    let summary = run(&root, ColorMode::ConvertToStandard);
    assert_eq!(summary.stats.converted, 1);

    let decoded = StandardCodec::new()
        .decode(&fs::read(root.join("a.jpg")).unwrap())
        .unwrap();
    assert_eq!(decoded.icc_profile.as_deref(), Some(bogus.as_slice()));
}

#[test]
fn test_strip_mode_embeds_no_profile() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    let codec = StandardCodec::new();
    let srgb = codec.standard_profile().unwrap();
    let pixels = RgbImage::from_pixel(8, 8, Rgb([40, 80, 160]));
    write_file(&root, "a.heic", &jpeg_bytes(&pixels, None, Some(&srgb)));

    run(&root, ColorMode::Strip);

    let decoded = codec.decode(&fs::read(root.join("a.jpg")).unwrap()).unwrap();
    assert!(decoded.icc_profile.is_none());
}

#[test]
fn test_orientation_applied_and_reset() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    let pixels = RgbImage::from_pixel(16, 8, Rgb([200, 200, 200]));
    write_file(&root, "a.heic", &jpeg_bytes(&pixels, Some(&tiff_orientation(6)), None));

    let summary = run(&root, ColorMode::Strip);
    assert_eq!(summary.stats.converted, 1);

    let decoded = StandardCodec::new()
        .decode(&fs::read(root.join("a.jpg")).unwrap())
        .unwrap();
    assert_eq!(decoded.pixels.width(), 8);
    assert_eq!(decoded.pixels.height(), 16);
    assert!(decoded.exif.is_some(), "exif should be carried over");
    // A surviving rotate tag would make the reader report a transform
    assert_eq!(decoded.orientation, Orientation::NoTransforms);
}

#[test]
fn test_transparency_flattened_over_white() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    let pixels = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
    write_file(&root, "a.heif", &png_bytes(DynamicImage::ImageRgba8(pixels)));

    let summary = run(&root, ColorMode::Strip);
    assert_eq!(summary.stats.converted, 1);

    let decoded = StandardCodec::new()
        .decode(&fs::read(root.join("a.jpg")).unwrap())
        .unwrap();
    let rgb = decoded.pixels.to_rgb8();
    for p in rgb.pixels() {
        assert!(p.0.iter().all(|c| *c >= 250));
    }
}
