//! Minimal EXIF (TIFF) helpers.
//!
//! Only what the converter needs: locating the orientation tag in IFD0 and
//! rewriting it once the pixels have been rotated, plus building the APP1
//! payload for JPEG output.

/// `Exif\0\0` marker that prefixes the TIFF structure inside JPEG APP1
pub const EXIF_HEADER: &[u8] = b"Exif\0\0";

const TAG_ORIENTATION: u16 = 0x0112;
const TYPE_SHORT: u16 = 3;
const ORIENTATION_TOP_LEFT: u16 = 1;

#[derive(Clone, Copy)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn u16(self, b: &[u8]) -> u16 {
        match self {
            ByteOrder::Little => u16::from_le_bytes([b[0], b[1]]),
            ByteOrder::Big => u16::from_be_bytes([b[0], b[1]]),
        }
    }

    fn u32(self, b: &[u8]) -> u32 {
        match self {
            ByteOrder::Little => u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            ByteOrder::Big => u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
        }
    }

    fn put_u16(self, b: &mut [u8], value: u16) {
        let bytes = match self {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        };
        b[..2].copy_from_slice(&bytes);
    }
}

/// Offset of the TIFF header inside `blob`, skipping an `Exif\0\0` prefix
fn tiff_start(blob: &[u8]) -> usize {
    if blob.starts_with(EXIF_HEADER) {
        EXIF_HEADER.len()
    } else {
        0
    }
}

/// Locate the value slot of the IFD0 orientation entry.
///
/// Returns the byte order and the absolute offset of the SHORT value in `blob`.
fn find_orientation(blob: &[u8]) -> Option<(ByteOrder, usize)> {
    let start = tiff_start(blob);
    let tiff = blob.get(start..)?;
    if tiff.len() < 8 {
        return None;
    }
    let order = match &tiff[..2] {
        b"II" => ByteOrder::Little,
        b"MM" => ByteOrder::Big,
        _ => return None,
    };
    if order.u16(&tiff[2..4]) != 42 {
        return None;
    }

    let ifd = order.u32(&tiff[4..8]) as usize;
    let count = order.u16(tiff.get(ifd..ifd + 2)?) as usize;
    for i in 0..count {
        let entry = ifd + 2 + i * 12;
        let raw = tiff.get(entry..entry + 12)?;
        if order.u16(&raw[0..2]) == TAG_ORIENTATION {
            if order.u16(&raw[2..4]) != TYPE_SHORT || order.u32(&raw[4..8]) < 1 {
                return None;
            }
            return Some((order, start + entry + 8));
        }
    }
    None
}

/// Read the orientation tag (1-8) from an EXIF block
#[cfg(test)]
pub(crate) fn orientation(blob: &[u8]) -> Option<u16> {
    let (order, offset) = find_orientation(blob)?;
    Some(order.u16(&blob[offset..offset + 2]))
}

/// Rewrite the orientation tag to top-left (1).
///
/// Returns true when a tag was found. Blocks without an orientation tag, or
/// that cannot be parsed, are left untouched.
pub fn reset_orientation(blob: &mut [u8]) -> bool {
    match find_orientation(blob) {
        Some((order, offset)) => {
            order.put_u16(&mut blob[offset..offset + 2], ORIENTATION_TOP_LEFT);
            true
        }
        None => false,
    }
}

/// Build a JPEG APP1 payload (`Exif\0\0` followed by the TIFF structure)
pub fn app1_payload(blob: &[u8]) -> Vec<u8> {
    if blob.starts_with(EXIF_HEADER) {
        blob.to_vec()
    } else {
        let mut payload = Vec::with_capacity(EXIF_HEADER.len() + blob.len());
        payload.extend_from_slice(EXIF_HEADER);
        payload.extend_from_slice(blob);
        payload
    }
}

#[cfg(test)]
pub(crate) fn tiff_with_orientation(value: u16, big_endian: bool) -> Vec<u8> {
    let order = if big_endian { ByteOrder::Big } else { ByteOrder::Little };
    let mut out = Vec::new();
    out.extend_from_slice(if big_endian { b"MM" } else { b"II" });
    let push16 = |out: &mut Vec<u8>, v: u16| {
        let mut b = [0u8; 2];
        order.put_u16(&mut b, v);
        out.extend_from_slice(&b);
    };
    push16(&mut out, 42);
    out.extend_from_slice(&if big_endian { 8u32.to_be_bytes() } else { 8u32.to_le_bytes() });
    // IFD0 with a Make entry followed by Orientation
    push16(&mut out, 2);
    push16(&mut out, 0x010F);
    push16(&mut out, 2);
    out.extend_from_slice(&if big_endian { 4u32.to_be_bytes() } else { 4u32.to_le_bytes() });
    out.extend_from_slice(b"ACME");
    push16(&mut out, TAG_ORIENTATION);
    push16(&mut out, TYPE_SHORT);
    out.extend_from_slice(&if big_endian { 1u32.to_be_bytes() } else { 1u32.to_le_bytes() });
    push16(&mut out, value);
    push16(&mut out, 0);
    out.extend_from_slice(&[0, 0, 0, 0]);
    out
}
