use nom::{
    combinator::map_res,
    number::complete::{be_u32, u8},
    sequence::tuple,
    IResult,
};

use super::{write_chunk, ParseableChunk, WritableChunk};
use crate::png::DecodeError;

pub(crate) const HEADER: &[u8; 4] = b"IHDR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IHDRChunk {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) bit_depth: u8,
    pub(crate) color_type: ColorType,
    pub(crate) compression_method: u8,
    pub(crate) filter_method: u8,
    pub(crate) interlace_method: Interlacing,
}
impl IHDRChunk {
    /// Header for a non-interlaced 8-bit RGBA image.
    pub(crate) fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bit_depth: 8,
            color_type: ColorType::TruecolorWithAlpha,
            compression_method: 0,
            filter_method: 0,
            interlace_method: Interlacing::None,
        }
    }

    /// Byte distance used by the scanline filters: bytes per complete pixel,
    /// rounded up to one.
    pub(crate) fn filter_width(&self) -> usize {
        let sample_width = usize::max(self.bit_depth as usize / 8, 1);
        self.color_type.channel_count() * sample_width
    }

    /// Bits per pixel.
    pub(crate) fn pixel_width(&self) -> usize {
        self.color_type.channel_count() * self.bit_depth as usize
    }

    /// Unfiltered bytes in one row of `width` pixels.
    pub(crate) fn row_bytes(&self, width: usize) -> usize {
        (width * self.pixel_width()).div_ceil(8)
    }

    pub(crate) fn validate(&self) -> Result<(), DecodeError> {
        let invalid = |reason: String| Err(DecodeError::InvalidHeader(reason));
        if self.width == 0 || self.height == 0 {
            return invalid(format!("{}x{} has no pixels", self.width, self.height));
        }
        if self.width > i32::MAX as u32 || self.height > i32::MAX as u32 {
            return invalid(format!("{}x{} is too large", self.width, self.height));
        }
        if !self.color_type.allowed_bit_depths().contains(&self.bit_depth) {
            return invalid(format!(
                "bit depth {} is not allowed for {:?}",
                self.bit_depth, self.color_type
            ));
        }
        if self.compression_method != 0 {
            return invalid(format!(
                "unknown compression method {}",
                self.compression_method
            ));
        }
        if self.filter_method != 0 {
            return invalid(format!("unknown filter method {}", self.filter_method));
        }
        if (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .is_none()
        {
            return invalid(format!("{}x{} overflows memory", self.width, self.height));
        }
        Ok(())
    }
}
impl<'a> ParseableChunk<'a> for IHDRChunk {
    fn from_bytes(chunk_data: &'a [u8]) -> IResult<&'a [u8], Self> {
        let (
            rest,
            (width, height, bit_depth, color_type, compression_method, filter_method, interlace),
        ) = tuple((
            be_u32,
            be_u32,
            u8,
            map_res(u8, ColorType::try_from),
            u8,
            u8,
            map_res(u8, Interlacing::try_from),
        ))(chunk_data)?;
        Ok((
            rest,
            IHDRChunk {
                width,
                height,
                bit_depth,
                color_type,
                compression_method,
                filter_method,
                interlace_method: interlace,
            },
        ))
    }
}
impl WritableChunk for IHDRChunk {
    fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(13);
        data.extend(self.width.to_be_bytes());
        data.extend(self.height.to_be_bytes());
        data.extend([
            self.bit_depth,
            self.color_type as u8,
            self.compression_method,
            self.filter_method,
            self.interlace_method as u8,
        ]);
        write_chunk(HEADER, &data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColorType {
    Greyscale = 0,
    Truecolor = 2,
    IndexedColor = 3,
    GreyscaleWithAlpha = 4,
    TruecolorWithAlpha = 6,
}
impl TryFrom<u8> for ColorType {
    type Error = DecodeError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Greyscale),
            2 => Ok(Self::Truecolor),
            3 => Ok(Self::IndexedColor),
            4 => Ok(Self::GreyscaleWithAlpha),
            6 => Ok(Self::TruecolorWithAlpha),
            v => Err(DecodeError::InvalidHeader(format!("unknown color type {v}"))),
        }
    }
}
impl ColorType {
    pub(crate) fn channel_count(&self) -> usize {
        match self {
            Self::Greyscale => 1,
            Self::IndexedColor => 1,
            Self::GreyscaleWithAlpha => 2,
            Self::Truecolor => 3,
            Self::TruecolorWithAlpha => 4,
        }
    }

    fn allowed_bit_depths(&self) -> &'static [u8] {
        match self {
            Self::Greyscale => &[1, 2, 4, 8, 16],
            Self::IndexedColor => &[1, 2, 4, 8],
            Self::Truecolor | Self::GreyscaleWithAlpha | Self::TruecolorWithAlpha => &[8, 16],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interlacing {
    None = 0,
    Adam7 = 1,
}
impl TryFrom<u8> for Interlacing {
    type Error = DecodeError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Adam7),
            v => Err(DecodeError::InvalidHeader(format!(
                "unknown interlace method {v}"
            ))),
        }
    }
}
