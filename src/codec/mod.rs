//! Image codec capability used by the worker.
//!
//! The worker never decodes, encodes or transforms pixels itself; it goes
//! through [`ImageCodec`]. [`StandardCodec`] is the implementation used by the
//! binary. Tests substitute their own implementations to inject faults.

pub mod exif;
mod standard;

use image::metadata::Orientation;
use image::{DynamicImage, RgbImage};

use crate::config::{ChromaSubsampling, ConversionConfig};
use crate::error::CodecError;

pub use standard::StandardCodec;

/// A decoded source image and the metadata carried alongside it
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Pixel data as stored in the file (not yet oriented)
    pub pixels: DynamicImage,
    /// Orientation the pixels must be transformed by to display upright
    pub orientation: Orientation,
    /// Raw EXIF block (TIFF structure, optionally prefixed by `Exif\0\0`)
    pub exif: Option<Vec<u8>>,
    /// Embedded ICC profile
    pub icc_profile: Option<Vec<u8>>,
}

impl DecodedImage {
    /// Wrap pixels with no metadata
    pub fn new(pixels: DynamicImage) -> Self {
        Self {
            pixels,
            orientation: Orientation::NoTransforms,
            exif: None,
            icc_profile: None,
        }
    }
}

/// Encoder settings derived from the run configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    /// JPEG quality (1-100)
    pub quality: u8,
    /// Chroma subsampling
    pub subsampling: ChromaSubsampling,
    /// Optimized Huffman tables
    pub optimize: bool,
    /// Progressive scan
    pub progressive: bool,
}

impl From<&ConversionConfig> for EncodeSettings {
    fn from(config: &ConversionConfig) -> Self {
        Self {
            quality: config.quality,
            subsampling: config.subsampling,
            optimize: config.optimize,
            progressive: config.progressive,
        }
    }
}

/// Decode, encode and color-transform operations
///
/// Implementations are shared by every worker thread and must not keep
/// per-item state.
pub trait ImageCodec: Send + Sync {
    /// Decode an encoded image held in memory
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError>;

    /// Encode RGB pixels, embedding the EXIF block and ICC profile when given
    fn encode(
        &self,
        pixels: &RgbImage,
        exif: Option<&[u8]>,
        icc_profile: Option<&[u8]>,
        settings: &EncodeSettings,
    ) -> Result<Vec<u8>, CodecError>;

    /// Transform pixels from `source_profile` into `target_profile`
    fn transform_color(
        &self,
        pixels: &RgbImage,
        source_profile: &[u8],
        target_profile: &[u8],
    ) -> Result<RgbImage, CodecError>;

    /// ICC bytes of the standard (sRGB) profile
    fn standard_profile(&self) -> Result<Vec<u8>, CodecError>;
}
