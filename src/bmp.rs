//! Writer for 16 bit-per-pixel BMP files using `BI_BITFIELDS` 5-6-5 masks.
//!
//! Rows are taken in the order they are stored on disk, which for BMP is
//! bottom-up: the first row handed in is the bottom row of the picture.
use crate::error::{Error, Result};

const FILE_HEADER_SIZE: u32 = 14;
const INFO_HEADER_SIZE: u32 = 40;
const MASKS_SIZE: u32 = 12;
const PIXEL_OFFSET: u32 = FILE_HEADER_SIZE + INFO_HEADER_SIZE + MASKS_SIZE;

const BI_BITFIELDS: u32 = 3;
const BITS_PER_PIXEL: u16 = 16;
// 72 DPI
const PIXELS_PER_METER: i32 = 2835;

const RED_MASK: u32 = 0xF800;
const GREEN_MASK: u32 = 0x07E0;
const BLUE_MASK: u32 = 0x001F;

/// Bytes per stored row, padded to a 4-byte boundary.
pub(crate) const fn row_stride(width: u32) -> usize {
    (width as usize * 2 + 3) & !3
}

pub(crate) fn encode_rgb565<R, P>(width: u32, height: u32, rows: R) -> Result<Vec<u8>>
where
    R: IntoIterator<Item = P>,
    P: IntoIterator<Item = u16>,
{
    let stride = row_stride(width);
    let image_size = stride
        .checked_mul(height as usize)
        .and_then(|size| u32::try_from(size).ok())
        .filter(|size| size.checked_add(PIXEL_OFFSET).is_some())
        .ok_or_else(|| Error::Encode(format!("{width}x{height} is too large for a BMP file")))?;
    let signed = |v: u32| {
        i32::try_from(v)
            .map_err(|_| Error::Encode(format!("{width}x{height} is too large for a BMP file")))
    };
    let (signed_width, signed_height) = (signed(width)?, signed(height)?);

    let mut bytes = Vec::with_capacity((PIXEL_OFFSET + image_size) as usize);
    bytes.extend(b"BM");
    bytes.extend((PIXEL_OFFSET + image_size).to_le_bytes());
    bytes.extend([0u8; 4]);
    bytes.extend(PIXEL_OFFSET.to_le_bytes());

    bytes.extend(INFO_HEADER_SIZE.to_le_bytes());
    bytes.extend(signed_width.to_le_bytes());
    // Positive height marks the rows as bottom-up.
    bytes.extend(signed_height.to_le_bytes());
    bytes.extend(1u16.to_le_bytes());
    bytes.extend(BITS_PER_PIXEL.to_le_bytes());
    bytes.extend(BI_BITFIELDS.to_le_bytes());
    bytes.extend(image_size.to_le_bytes());
    bytes.extend(PIXELS_PER_METER.to_le_bytes());
    bytes.extend(PIXELS_PER_METER.to_le_bytes());
    bytes.extend(0u32.to_le_bytes());
    bytes.extend(0u32.to_le_bytes());

    for mask in [RED_MASK, GREEN_MASK, BLUE_MASK] {
        bytes.extend(mask.to_le_bytes());
    }

    let mut row_count = 0;
    for row in rows {
        let start = bytes.len();
        bytes.extend(row.into_iter().flat_map(u16::to_le_bytes));
        let written = bytes.len() - start;
        if written != width as usize * 2 {
            return Err(Error::Encode(format!(
                "row {row_count} holds {} pixels, expected {width}",
                written / 2
            )));
        }
        bytes.resize(start + stride, 0);
        row_count += 1;
    }
    if row_count != height as usize {
        return Err(Error::Encode(format!(
            "got {row_count} rows, expected {height}"
        )));
    }
    Ok(bytes)
}
