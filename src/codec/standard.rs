//! Default codec: `image` for decoding, `jpeg-encoder` for output and
//! `lcms2` for ICC transforms. HEIF containers are decoded through libheif
//! when the `heif` feature is enabled.

use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};
use jpeg_encoder::{ColorType, Encoder, SamplingFactor};
use lcms2::{Intent, PixelFormat, Profile, Transform};
use std::io::Cursor;

use super::{exif, DecodedImage, EncodeSettings, ImageCodec};
use crate::config::ChromaSubsampling;
use crate::error::CodecError;

/// ISO-BMFF brands used by HEIF/HEIC files
const HEIF_BRANDS: &[&[u8; 4]] = &[
    b"heic", b"heix", b"heim", b"heis", b"hevc", b"hevx", b"hevm", b"hevs", b"mif1", b"msf1",
];

/// Codec backed by ecosystem crates
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardCodec;

impl StandardCodec {
    /// Create the codec
    pub fn new() -> Self {
        Self
    }

    /// Check whether `bytes` look like a HEIF container
    pub fn is_heif(bytes: &[u8]) -> bool {
        if bytes.len() < 12 || &bytes[4..8] != b"ftyp" {
            return false;
        }
        HEIF_BRANDS.iter().any(|brand| &bytes[8..12] == *brand)
    }

    fn decode_with_image(bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CodecError::Decode(format!("cannot read image data: {}", e)))?;
        if reader.format().is_none() {
            return Err(CodecError::Unsupported("unrecognized image data".to_string()));
        }

        let mut decoder = reader.into_decoder()?;
        // Metadata is best effort; a broken chunk must not cost us the pixels.
        let icc_profile = decoder.icc_profile().unwrap_or_else(|e| {
            log::debug!("Ignoring unreadable ICC profile: {}", e);
            None
        });
        let exif = decoder.exif_metadata().unwrap_or_else(|e| {
            log::debug!("Ignoring unreadable EXIF block: {}", e);
            None
        });
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
        let pixels = DynamicImage::from_decoder(decoder)?;

        Ok(DecodedImage {
            pixels,
            orientation,
            exif,
            icc_profile,
        })
    }

    #[cfg(feature = "heif")]
    fn decode_heif(bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        use image::RgbaImage;
        use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

        let heif_err = |e: libheif_rs::HeifError| CodecError::Decode(e.to_string());

        let lib = LibHeif::new();
        let ctx = HeifContext::read_from_bytes(bytes).map_err(heif_err)?;
        let handle = ctx.primary_image_handle().map_err(heif_err)?;
        let has_alpha = handle.has_alpha_channel();
        let chroma = if has_alpha { RgbChroma::Rgba } else { RgbChroma::Rgb };
        let decoded = lib
            .decode(&handle, ColorSpace::Rgb(chroma), None)
            .map_err(heif_err)?;

        let planes = decoded.planes();
        let plane = planes
            .interleaved
            .ok_or_else(|| CodecError::Decode("decoder returned no interleaved plane".to_string()))?;
        let channels = if has_alpha { 4 } else { 3 };
        let row_len = plane.width as usize * channels;
        let mut data = Vec::with_capacity(row_len * plane.height as usize);
        for row in plane.data.chunks(plane.stride).take(plane.height as usize) {
            data.extend_from_slice(&row[..row_len]);
        }

        let size_err = || CodecError::Decode("pixel buffer does not match image size".to_string());
        let pixels = if has_alpha {
            DynamicImage::ImageRgba8(
                RgbaImage::from_raw(plane.width, plane.height, data).ok_or_else(size_err)?,
            )
        } else {
            DynamicImage::ImageRgb8(
                RgbImage::from_raw(plane.width, plane.height, data).ok_or_else(size_err)?,
            )
        };

        // HEIF stores EXIF as a 4-byte offset followed by the TIFF structure.
        let exif = handle
            .metadata_block_ids(b"Exif")
            .into_iter()
            .find_map(|id| handle.metadata(id).ok())
            .and_then(|block| {
                let skip = u32::from_be_bytes(block.get(..4)?.try_into().ok()?) as usize;
                block.get(4 + skip..).map(|tiff| tiff.to_vec())
            });

        Ok(DecodedImage {
            pixels,
            // libheif applies the container's rotation and mirroring itself
            orientation: Orientation::NoTransforms,
            exif,
            icc_profile: handle.color_profile_raw().map(|p| p.data),
        })
    }

    #[cfg(not(feature = "heif"))]
    fn decode_heif(_bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        Err(CodecError::Unsupported(
            "HEIF decoding requires building with the `heif` feature".to_string(),
        ))
    }
}

fn sampling_factor(subsampling: ChromaSubsampling) -> SamplingFactor {
    match subsampling {
        ChromaSubsampling::Yuv444 => SamplingFactor::F_1_1,
        ChromaSubsampling::Yuv422 => SamplingFactor::F_2_1,
        ChromaSubsampling::Yuv420 => SamplingFactor::F_2_2,
    }
}

impl ImageCodec for StandardCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        if Self::is_heif(bytes) {
            Self::decode_heif(bytes)
        } else {
            Self::decode_with_image(bytes)
        }
    }

    fn encode(
        &self,
        pixels: &RgbImage,
        exif: Option<&[u8]>,
        icc_profile: Option<&[u8]>,
        settings: &EncodeSettings,
    ) -> Result<Vec<u8>, CodecError> {
        let too_large = |dim: u32| CodecError::Encode(format!("dimension {} exceeds the JPEG limit of 65535", dim));
        let width = u16::try_from(pixels.width()).map_err(|_| too_large(pixels.width()))?;
        let height = u16::try_from(pixels.height()).map_err(|_| too_large(pixels.height()))?;

        let mut out = Vec::new();
        let mut encoder = Encoder::new(&mut out, settings.quality);
        encoder.set_sampling_factor(sampling_factor(settings.subsampling));
        encoder.set_progressive(settings.progressive);
        encoder.set_optimized_huffman_tables(settings.optimize);
        if let Some(blob) = exif {
            encoder.add_app_segment(1, &exif::app1_payload(blob))?;
        }
        if let Some(icc) = icc_profile {
            encoder.add_icc_profile(icc)?;
        }
        encoder.encode(pixels.as_raw(), width, height, ColorType::Rgb)?;

        Ok(out)
    }

    fn transform_color(
        &self,
        pixels: &RgbImage,
        source_profile: &[u8],
        target_profile: &[u8],
    ) -> Result<RgbImage, CodecError> {
        let source = Profile::new_icc(source_profile)?;
        let target = Profile::new_icc(target_profile)?;
        let transform: Transform<[u8; 3], [u8; 3]> = Transform::new(
            &source,
            PixelFormat::RGB_8,
            &target,
            PixelFormat::RGB_8,
            Intent::Perceptual,
        )?;

        let input: Vec<[u8; 3]> = pixels.pixels().map(|p| p.0).collect();
        let mut output = vec![[0u8; 3]; input.len()];
        transform.transform_pixels(&input, &mut output);

        let raw: Vec<u8> = output.into_iter().flatten().collect();
        RgbImage::from_raw(pixels.width(), pixels.height(), raw)
            .ok_or_else(|| CodecError::ColorTransform("transformed buffer has the wrong size".to_string()))
    }

    fn standard_profile(&self) -> Result<Vec<u8>, CodecError> {
        Ok(Profile::new_srgb().icc()?)
    }
}
