//! Transcode worker - converts a single source item.
//!
//! [`convert`] is the only entry point. It touches nothing but the item's
//! source path and its destination, and every failure is turned into an
//! [`Outcome`] here so one bad file never aborts the batch.
//!
//! Stage order matters: the source is only deleted after the destination
//! has been fully written and verified to be non-empty.

use image::{DynamicImage, Rgb, RgbImage};
use std::fs;
use std::path::Path;

use crate::codec::{exif, EncodeSettings, ImageCodec};
use crate::color;
use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::models::{Outcome, SourceItem};

/// Background used when flattening transparency
pub const ALPHA_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Reason reported for items whose destination already exists
pub const SKIP_DESTINATION_EXISTS: &str = "destination exists";

/// Convert one item, returning its outcome
pub fn convert(item: &SourceItem, config: &ConversionConfig, codec: &dyn ImageCodec) -> Outcome {
    let source = item.path.as_path();
    let destination = item.destination();

    if !config.overwrite && destination.exists() {
        log::debug!("Skipping {}: destination exists", source.display());
        return Outcome::skipped(source, SKIP_DESTINATION_EXISTS);
    }

    // Stages 1-5
    if let Err(e) = transcode(source, &destination, config, codec) {
        log::warn!("Failed to convert {}: {}", source.display(), e);
        return Outcome::failed(source, e.to_string());
    }

    // Stage 6
    if let Err(e) = verify_output(&destination) {
        remove_artifact(&destination);
        log::warn!("Failed to convert {}: {}", source.display(), e);
        return Outcome::failed(source, e.to_string());
    }

    match fs::remove_file(source) {
        Ok(()) => {
            log::debug!("Converted {} -> {}", source.display(), destination.display());
            Outcome::converted(source, destination)
        }
        Err(e) => {
            let warning = ConvertError::SourceDelete(e);
            log::warn!("Converted {} but {}", source.display(), warning);
            Outcome::converted(source, destination).with_warning(warning.to_string())
        }
    }
}

/// Decode, normalize, color-manage and encode `source` into `destination`
fn transcode(
    source: &Path,
    destination: &Path,
    config: &ConversionConfig,
    codec: &dyn ImageCodec,
) -> Result<(), ConvertError> {
    let bytes = fs::read(source).map_err(|e| ConvertError::Decode(e.to_string()))?;
    let decoded = codec
        .decode(&bytes)
        .map_err(|e| ConvertError::Decode(e.to_string()))?;
    drop(bytes);

    let mut pixels = decoded.pixels;
    pixels.apply_orientation(decoded.orientation);
    let exif_blob = decoded.exif.map(|mut blob| {
        exif::reset_orientation(&mut blob);
        blob
    });

    let rgb = flatten(pixels);

    let resolved = color::resolve(codec, config.color_mode, rgb, decoded.icc_profile.as_deref());
    log::debug!(
        "{}: color strategy {:?}, profile {}",
        source.display(),
        resolved.strategy,
        if resolved.profile.is_some() { "embedded" } else { "none" }
    );

    let encoded = codec
        .encode(
            &resolved.pixels,
            exif_blob.as_deref().filter(|b| !b.is_empty()),
            resolved.profile.as_deref(),
            &EncodeSettings::from(config),
        )
        .map_err(|e| ConvertError::Encode(e.to_string()))?;

    if let Err(e) = fs::write(destination, &encoded) {
        remove_artifact(destination);
        return Err(ConvertError::Encode(format!(
            "cannot write {}: {}",
            destination.display(),
            e
        )));
    }

    Ok(())
}

/// Composite transparent images over white, coerce everything to 8-bit RGB
pub fn flatten(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return match image {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => other.to_rgb8(),
        };
    }

    let rgba = image.to_rgba8();
    let [br, bg, bb] = ALPHA_BACKGROUND.0;
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = a as u32;
        let blend = |c: u8, bgc: u8| ((c as u32 * a + bgc as u32 * (255 - a) + 127) / 255) as u8;
        Rgb([blend(r, br), blend(g, bg), blend(b, bb)])
    })
}

/// Check that the destination exists and is not empty
fn verify_output(destination: &Path) -> Result<(), ConvertError> {
    match fs::metadata(destination) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(ConvertError::Verification {
            path: destination.to_path_buf(),
        }),
    }
}

/// Remove a destination we produced, ignoring a missing file
fn remove_artifact(destination: &Path) {
    if let Err(e) = fs::remove_file(destination) {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("Could not remove {}: {}", destination.display(), e);
        }
    }
}
