use nom::IResult;

use super::{ihdr::ColorType, ParseableChunk};
use crate::png::DecodeError;

pub(crate) const HEADER: &[u8; 4] = b"tRNS";

#[allow(non_camel_case_types)]
#[derive(Debug)]
pub(crate) struct tRNSChunk<'a> {
    inner: &'a [u8],
}

/// Simple transparency, interpreted for the image's color type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Transparency {
    /// Grey sample value that is fully transparent.
    Greyscale(u16),
    /// RGB sample values that are fully transparent.
    Truecolor([u16; 3]),
    /// Alpha per palette entry; missing entries are opaque.
    Palette(Vec<u8>),
}
impl Transparency {
    pub(crate) fn palette_alpha(&self, index: u8) -> u8 {
        match self {
            Self::Palette(alphas) => alphas.get(index as usize).copied().unwrap_or(u8::MAX),
            _ => u8::MAX,
        }
    }
}

impl tRNSChunk<'_> {
    pub(crate) fn transparency(
        &self,
        color_type: ColorType,
    ) -> Result<Option<Transparency>, DecodeError> {
        let sample = |i: usize| {
            self.inner
                .get(i * 2..i * 2 + 2)
                .map(|bytes| u16::from_be_bytes([bytes[0], bytes[1]]))
                .ok_or_else(|| DecodeError::MalformedChunk("tRNS".to_owned()))
        };
        match color_type {
            ColorType::Greyscale => Ok(Some(Transparency::Greyscale(sample(0)?))),
            ColorType::Truecolor => Ok(Some(Transparency::Truecolor([
                sample(0)?,
                sample(1)?,
                sample(2)?,
            ]))),
            ColorType::IndexedColor => Ok(Some(Transparency::Palette(self.inner.to_vec()))),
            ColorType::GreyscaleWithAlpha | ColorType::TruecolorWithAlpha => {
                log::warn!("Ignoring tRNS chunk on an image with an alpha channel");
                Ok(None)
            }
        }
    }
}
impl<'a> ParseableChunk<'a> for tRNSChunk<'a> {
    fn from_bytes(chunk_data: &'a [u8]) -> IResult<&'a [u8], Self> {
        Ok((&chunk_data[0..0], tRNSChunk { inner: chunk_data }))
    }
}

#[cfg(test)]
mod tests {
    use super::{tRNSChunk, Transparency};
    use crate::png::chunks::ihdr::ColorType;

    #[test]
    fn interprets_samples_per_color_type() {
        let chunk = tRNSChunk {
            inner: &[0, 7, 1, 0, 0, 255],
        };
        assert_eq!(
            chunk.transparency(ColorType::Greyscale).unwrap(),
            Some(Transparency::Greyscale(7))
        );
        assert_eq!(
            chunk.transparency(ColorType::Truecolor).unwrap(),
            Some(Transparency::Truecolor([7, 256, 255]))
        );
        assert_eq!(chunk.transparency(ColorType::TruecolorWithAlpha).unwrap(), None);
    }

    #[test]
    fn palette_alpha_defaults_to_opaque() {
        let chunk = tRNSChunk { inner: &[0, 128] };
        let transparency = chunk
            .transparency(ColorType::IndexedColor)
            .unwrap()
            .unwrap();
        assert_eq!(transparency.palette_alpha(0), 0);
        assert_eq!(transparency.palette_alpha(1), 128);
        assert_eq!(transparency.palette_alpha(2), 255);
    }

    #[test]
    fn short_truecolor_entry_is_malformed() {
        let chunk = tRNSChunk { inner: &[0, 1, 0] };
        assert!(chunk.transparency(ColorType::Truecolor).is_err());
    }
}
