//! Color profile handling.
//!
//! Each [`ColorMode`] maps to an ordered list of [`ProfileStrategy`] values.
//! Strategies are tried in order and the first one that succeeds decides the
//! output pixels and the profile embedded in the JPEG. The last strategy of
//! every list cannot fail, so profile handling never fails an item.

use image::RgbImage;

use crate::codec::ImageCodec;
use crate::config::ColorMode;
use crate::error::CodecError;

/// One way of deciding the output profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileStrategy {
    /// Transform into the standard profile and embed it
    ConvertToStandard,
    /// Embed the source profile unchanged
    KeepSource,
    /// Embed nothing
    Strip,
}

impl ProfileStrategy {
    /// Strategies for a mode, in the order they are tried
    pub fn chain(mode: ColorMode) -> &'static [ProfileStrategy] {
        match mode {
            ColorMode::ConvertToStandard => &[
                ProfileStrategy::ConvertToStandard,
                ProfileStrategy::KeepSource,
                ProfileStrategy::Strip,
            ],
            ColorMode::PreserveSource => &[ProfileStrategy::KeepSource],
            ColorMode::Strip => &[ProfileStrategy::Strip],
        }
    }

    /// Apply this strategy.
    ///
    /// Returns the transformed pixels when they changed, and the profile to
    /// embed.
    fn apply(
        self,
        codec: &dyn ImageCodec,
        pixels: &RgbImage,
        source_profile: Option<&[u8]>,
    ) -> Result<(Option<RgbImage>, Option<Vec<u8>>), CodecError> {
        match self {
            ProfileStrategy::ConvertToStandard => {
                let standard = codec.standard_profile()?;
                match source_profile {
                    Some(source) => {
                        let converted = codec.transform_color(pixels, source, &standard)?;
                        Ok((Some(converted), Some(standard)))
                    }
                    // Untagged pixels are taken to already be sRGB
                    None => Ok((None, Some(standard))),
                }
            }
            ProfileStrategy::KeepSource => Ok((None, source_profile.map(|p| p.to_vec()))),
            ProfileStrategy::Strip => Ok((None, None)),
        }
    }
}

/// Output of color management for one image
#[derive(Debug)]
pub struct ColorResolution {
    /// Pixels to encode
    pub pixels: RgbImage,
    /// Profile to embed
    pub profile: Option<Vec<u8>>,
    /// Strategy that produced this result
    pub strategy: ProfileStrategy,
}

/// Run the strategy chain for `mode`
pub fn resolve(
    codec: &dyn ImageCodec,
    mode: ColorMode,
    pixels: RgbImage,
    source_profile: Option<&[u8]>,
) -> ColorResolution {
    for &strategy in ProfileStrategy::chain(mode) {
        match strategy.apply(codec, &pixels, source_profile) {
            Ok((converted, profile)) => {
                return ColorResolution {
                    pixels: converted.unwrap_or(pixels),
                    profile,
                    strategy,
                };
            }
            Err(e) => {
                log::warn!("Color strategy {:?} failed, falling back: {}", strategy, e);
            }
        }
    }

    // Every chain ends with an infallible strategy
    ColorResolution {
        pixels,
        profile: None,
        strategy: ProfileStrategy::Strip,
    }
}
