//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::path::Path;

use heic2jpg::{CodecError, DecodedImage, EncodeSettings, ImageCodec};
use image::{DynamicImage, RgbImage};

pub const STANDARD_PROFILE: &[u8] = b"standard-rgb";

/// In-memory codec.
///
/// Valid sources are `IMG` optionally followed by `;profile=<bytes>`.
/// Output is `JPEG` followed by `;icc=<bytes>` when a profile is embedded.
#[derive(Default)]
pub struct FakeCodec {
    pub empty_output: bool,
}

impl ImageCodec for FakeCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        let text = std::str::from_utf8(bytes).map_err(|e| CodecError::Decode(e.to_string()))?;
        let rest = text
            .strip_prefix("IMG")
            .ok_or_else(|| CodecError::Decode("corrupt input".to_string()))?;

        let mut decoded = DecodedImage::new(DynamicImage::ImageRgb8(RgbImage::new(2, 2)));
        if let Some(profile) = rest.strip_prefix(";profile=") {
            decoded.icc_profile = Some(profile.as_bytes().to_vec());
        }
        Ok(decoded)
    }

    fn encode(
        &self,
        _pixels: &RgbImage,
        _exif: Option<&[u8]>,
        icc_profile: Option<&[u8]>,
        _settings: &EncodeSettings,
    ) -> Result<Vec<u8>, CodecError> {
        if self.empty_output {
            return Ok(Vec::new());
        }
        let mut out = b"JPEG".to_vec();
        if let Some(icc) = icc_profile {
            out.extend_from_slice(b";icc=");
            out.extend_from_slice(icc);
        }
        Ok(out)
    }

    fn transform_color(&self, pixels: &RgbImage, source: &[u8], _target: &[u8]) -> Result<RgbImage, CodecError> {
        if source.starts_with(b"corrupt") {
            return Err(CodecError::ColorTransform("unparseable profile".to_string()));
        }
        Ok(pixels.clone())
    }

    fn standard_profile(&self) -> Result<Vec<u8>, CodecError> {
        Ok(STANDARD_PROFILE.to_vec())
    }
}

/// Write `contents` to `dir/name`
pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
