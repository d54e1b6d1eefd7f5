//! PNG decoding into 8-bit RGBA and encoding from it.
//!
//! Decoding accepts every standard color type and bit depth, Adam7
//! interlacing and tRNS transparency. Encoding always writes a non-interlaced
//! 8-bit RGBA image.
use miniz_oxide::{deflate::compress_to_vec_zlib, inflate::decompress_to_vec_zlib};
use nom::{bytes::complete::tag, IResult};

use crate::Pixel;

mod chunks;
mod crc;
mod filters;
mod interlacing;
mod scanlines;

use chunks::{
    idat::IDATChunk,
    iend::IENDChunk,
    ihdr::{IHDRChunk, Interlacing},
    Chunk, WritableChunk,
};
use filters::{filter_scanlines, reconstruct_scanlines, Filter};
use interlacing::Adam7Iter;
use scanlines::PixelDecoder;

const SIGNATURE: &[u8; 8] = b"\x89PNG\x0d\x0a\x1a\x0a";
const COMPRESSION_LEVEL: u8 = 9;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("input doesn't start with the PNG signature")]
    Signature,
    #[error("first chunk must be IHDR")]
    MissingHeader,
    #[error("chunk data ends unexpectedly")]
    Truncated,
    #[error("malformed {0} chunk")]
    MalformedChunk(String),
    #[error("invalid image header: {0}")]
    InvalidHeader(String),
    #[error("unknown scanline filter type {0}")]
    UnknownFilter(u8),
    #[error("palette index {0} is out of range")]
    PaletteIndex(u8),
    #[error("no IDAT chunk found")]
    MissingData,
    #[error("failed to decompress image data: {0}")]
    Decompress(String),
    #[error("CRC mismatch in {0} chunk")]
    Crc(String),
    #[error("unsupported critical chunk {0}")]
    UnsupportedChunk(String),
    #[error("image data is {actual} bytes, expected {expected}")]
    DataSize { expected: usize, actual: usize },
    #[error("indexed image has no PLTE chunk")]
    MissingPalette,
    #[error("cannot allocate pixels for a {width}x{height} image")]
    Allocation { width: u32, height: u32 },
}
impl DecodeError {
    /// Stable numeric code for reporting.
    pub fn code(&self) -> u32 {
        match self {
            Self::Signature => 28,
            Self::MissingHeader => 29,
            Self::Truncated => 30,
            Self::MalformedChunk(_) => 31,
            Self::UnknownFilter(_) => 36,
            Self::InvalidHeader(_) => 37,
            Self::PaletteIndex(_) => 46,
            Self::MissingData => 48,
            Self::Decompress(_) => 52,
            Self::Crc(_) => 57,
            Self::UnsupportedChunk(_) => 69,
            Self::DataSize { .. } => 91,
            Self::MissingPalette => 106,
            Self::Allocation { .. } => 83,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("{width}x{height} can't be stored in a PNG")]
    Dimensions { width: u32, height: u32 },
    #[error("got {actual} pixels for a {width}x{height} image")]
    DataSize {
        width: u32,
        height: u32,
        actual: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA pixels.
    pub pixels: Vec<Pixel>,
}

fn parse_signature(input: &[u8]) -> IResult<&[u8], &[u8]> {
    tag(SIGNATURE)(input)
}

pub fn decode(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let (rest, _) = parse_signature(bytes).map_err(|_| DecodeError::Signature)?;
    let mut chunks = chunks::iter_chunks(rest);
    let header = match chunks.next() {
        Some(Ok(Chunk::IHDR(header))) => header,
        Some(Err(err)) => return Err(err),
        _ => return Err(DecodeError::MissingHeader),
    };
    header.validate()?;
    log::debug!("Decoding {header:?}");

    let mut palette = None;
    let mut transparency = None;
    let mut compressed = Vec::new();
    for chunk in chunks {
        match chunk? {
            Chunk::IHDR(_) => return Err(DecodeError::MalformedChunk("second IHDR".to_owned())),
            Chunk::PLTE(plte) => palette = Some(plte),
            Chunk::tRNS(trns) => transparency = trns.transparency(header.color_type)?,
            Chunk::IDAT(idat) => compressed.extend_from_slice(idat.data),
            Chunk::IEND => break,
            Chunk::Unknown(raw) if raw.is_critical() => {
                return Err(DecodeError::UnsupportedChunk(raw.name()))
            }
            Chunk::Unknown(raw) => log::debug!("Skipping ancillary {} chunk", raw.name()),
        }
    }
    if compressed.is_empty() {
        return Err(DecodeError::MissingData);
    }
    let data = decompress_to_vec_zlib(&compressed)
        .map_err(|err| DecodeError::Decompress(format!("{:?}", err.status)))?;

    let decoder = PixelDecoder::new(&header, palette.as_ref(), transparency)?;
    let (width, height) = (header.width as usize, header.height as usize);
    let expected = scanline_bytes(&header).ok_or_else(|| {
        DecodeError::InvalidHeader(format!("{width}x{height} overflows memory"))
    })?;
    if data.len() < expected {
        return Err(DecodeError::DataSize {
            expected,
            actual: data.len(),
        });
    }
    let allocation_failed = || DecodeError::Allocation {
        width: header.width,
        height: header.height,
    };
    let len = width.checked_mul(height).ok_or_else(allocation_failed)?;
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .map_err(|_| allocation_failed())?;
    pixels.resize(len, Pixel::default());
    match header.interlace_method {
        Interlacing::None => {
            let rows = unfilter(&data, &header, width, height)?;
            let row_bytes = header.row_bytes(width);
            for (y, row) in rows.chunks_exact(row_bytes).enumerate() {
                decoder.decode_row(row, width, |x, pixel| pixels[y * width + x] = pixel)?;
            }
        }
        Interlacing::Adam7 => {
            let mut offset = 0;
            for pass in Adam7Iter::new(width, height) {
                let len = pass.height * (header.row_bytes(pass.width) + 1);
                let scanlines = data.get(offset..offset + len).ok_or(DecodeError::DataSize {
                    expected: offset + len,
                    actual: data.len(),
                })?;
                offset += len;
                let rows = unfilter(scanlines, &header, pass.width, pass.height)?;
                let row_bytes = header.row_bytes(pass.width);
                for (y, row) in rows.chunks_exact(row_bytes).enumerate() {
                    decoder.decode_row(row, pass.width, |x, pixel| {
                        pixels[pass.pixel_index(x, y, width)] = pixel
                    })?;
                }
            }
        }
    }

    Ok(DecodedImage {
        width: header.width,
        height: header.height,
        pixels,
    })
}

/// Filtered scanline bytes the inflated stream must hold, summed over the
/// Adam7 passes when interlaced. `None` if the count doesn't fit in `usize`.
fn scanline_bytes(header: &IHDRChunk) -> Option<usize> {
    let pass_bytes = |width: usize, height: usize| {
        let row_bits = width.checked_mul(header.pixel_width())?;
        height.checked_mul(row_bits.div_ceil(8).checked_add(1)?)
    };
    let (width, height) = (header.width as usize, header.height as usize);
    match header.interlace_method {
        Interlacing::None => pass_bytes(width, height),
        Interlacing::Adam7 => Adam7Iter::new(width, height)
            .try_fold(0usize, |total, pass| {
                total.checked_add(pass_bytes(pass.width, pass.height)?)
            }),
    }
}

fn unfilter(
    scanlines: &[u8],
    header: &IHDRChunk,
    width: usize,
    height: usize,
) -> Result<Vec<u8>, DecodeError> {
    let expected = height * (header.row_bytes(width) + 1);
    if scanlines.len() < expected {
        return Err(DecodeError::DataSize {
            expected,
            actual: scanlines.len(),
        });
    }
    reconstruct_scanlines(
        &scanlines[..expected],
        header.row_bytes(width),
        header.filter_width(),
    )
}

pub fn encode(width: u32, height: u32, pixels: &[Pixel]) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
        return Err(EncodeError::Dimensions { width, height });
    }
    if (width as usize).checked_mul(height as usize) != Some(pixels.len()) {
        return Err(EncodeError::DataSize {
            width,
            height,
            actual: pixels.len(),
        });
    }
    let header = IHDRChunk::rgba8(width, height);
    let raw: Vec<u8> = pixels.iter().flat_map(Pixel::channels).collect();
    let filtered = filter_scanlines(
        &raw,
        header.row_bytes(width as usize),
        header.filter_width(),
        Filter::Sub,
    );
    let compressed = compress_to_vec_zlib(&filtered, COMPRESSION_LEVEL);
    log::debug!(
        "Compressed {} bytes of scanlines to {}",
        filtered.len(),
        compressed.len()
    );

    let mut bytes = SIGNATURE.to_vec();
    bytes.extend(header.to_bytes());
    bytes.extend(IDATChunk { data: &compressed }.to_bytes());
    bytes.extend(IENDChunk.to_bytes());
    Ok(bytes)
}
