//! Expansion of unfiltered scanline bytes into 8-bit RGBA pixels.
use super::{
    chunks::{
        ihdr::{ColorType, IHDRChunk},
        plte::PLTEChunk,
        trns::Transparency,
    },
    DecodeError,
};
use crate::Pixel;

/// Reads packed samples of 1, 2, 4, 8 or 16 bits, most significant bits first.
struct Samples<'a> {
    row: &'a [u8],
    bit_depth: usize,
    bit_offset: usize,
}
impl<'a> Samples<'a> {
    fn new(row: &'a [u8], bit_depth: u8) -> Self {
        Self {
            row,
            bit_depth: bit_depth as usize,
            bit_offset: 0,
        }
    }
}
impl Iterator for Samples<'_> {
    type Item = u16;
    fn next(&mut self) -> Option<Self::Item> {
        let byte = self.bit_offset / 8;
        let sample = match self.bit_depth {
            16 => u16::from_be_bytes([*self.row.get(byte)?, *self.row.get(byte + 1)?]),
            8 => *self.row.get(byte)? as u16,
            depth => {
                let shift = 8 - depth - self.bit_offset % 8;
                let mask = (1u8 << depth) - 1;
                ((*self.row.get(byte)? >> shift) & mask) as u16
            }
        };
        self.bit_offset += self.bit_depth;
        Some(sample)
    }
}

/// Scales a sample of `bit_depth` bits to the 0..=255 range. 16-bit samples
/// keep their high byte.
fn to_u8(sample: u16, bit_depth: u8) -> u8 {
    match bit_depth {
        16 => (sample >> 8) as u8,
        8 => sample as u8,
        depth => (sample as u32 * 255 / ((1u32 << depth) - 1)) as u8,
    }
}

pub(crate) struct PixelDecoder<'a> {
    header: &'a IHDRChunk,
    palette: Option<&'a PLTEChunk>,
    transparency: Option<Transparency>,
}
impl<'a> PixelDecoder<'a> {
    pub(crate) fn new(
        header: &'a IHDRChunk,
        palette: Option<&'a PLTEChunk>,
        transparency: Option<Transparency>,
    ) -> Result<Self, DecodeError> {
        if header.color_type == ColorType::IndexedColor && palette.is_none() {
            return Err(DecodeError::MissingPalette);
        }
        Ok(Self {
            header,
            palette,
            transparency,
        })
    }

    /// Decodes the first `width` pixels of an unfiltered row, handing each to
    /// `put` along with its column.
    pub(crate) fn decode_row(
        &self,
        row: &[u8],
        width: usize,
        mut put: impl FnMut(usize, Pixel),
    ) -> Result<(), DecodeError> {
        let depth = self.header.bit_depth;
        let channels = self.header.color_type.channel_count();
        let mut samples = Samples::new(row, depth);
        for x in 0..width {
            let mut raw = [0u16; 4];
            for sample in raw.iter_mut().take(channels) {
                *sample = samples.next().ok_or(DecodeError::Truncated)?;
            }
            let [s0, s1, s2, s3] = raw;
            let pixel = match self.header.color_type {
                ColorType::Greyscale => {
                    let grey = to_u8(s0, depth);
                    let alpha = match self.transparency {
                        Some(Transparency::Greyscale(key)) if key == s0 => 0,
                        _ => u8::MAX,
                    };
                    Pixel::new(grey, grey, grey, alpha)
                }
                ColorType::GreyscaleWithAlpha => {
                    let grey = to_u8(s0, depth);
                    Pixel::new(grey, grey, grey, to_u8(s1, depth))
                }
                ColorType::Truecolor => {
                    let alpha = match self.transparency {
                        Some(Transparency::Truecolor(key)) if key == [s0, s1, s2] => 0,
                        _ => u8::MAX,
                    };
                    Pixel::new(to_u8(s0, depth), to_u8(s1, depth), to_u8(s2, depth), alpha)
                }
                ColorType::TruecolorWithAlpha => Pixel::new(
                    to_u8(s0, depth),
                    to_u8(s1, depth),
                    to_u8(s2, depth),
                    to_u8(s3, depth),
                ),
                ColorType::IndexedColor => {
                    let index = s0 as u8;
                    let [red, green, blue] = self
                        .palette
                        .and_then(|palette| palette.get_color(index))
                        .ok_or(DecodeError::PaletteIndex(index))?;
                    let alpha = self
                        .transparency
                        .as_ref()
                        .map_or(u8::MAX, |t| t.palette_alpha(index));
                    Pixel::new(red, green, blue, alpha)
                }
            };
            put(x, pixel);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{to_u8, PixelDecoder, Samples};
    use crate::png::{
        chunks::{
            ihdr::{ColorType, IHDRChunk},
            plte::PLTEChunk,
            trns::Transparency,
            ParseableChunk,
        },
        DecodeError,
    };
    use crate::Pixel;

    fn ihdr(color_type: ColorType, bit_depth: u8) -> IHDRChunk {
        IHDRChunk {
            bit_depth,
            color_type,
            ..IHDRChunk::rgba8(4, 1)
        }
    }

    fn decode(decoder: &PixelDecoder, row: &[u8], width: usize) -> Vec<Pixel> {
        let mut pixels = vec![Pixel::default(); width];
        decoder
            .decode_row(row, width, |x, pixel| pixels[x] = pixel)
            .unwrap();
        pixels
    }

    #[test]
    fn samples_unpack_msb_first() {
        let one_bit: Vec<_> = Samples::new(&[0b1011_0000], 1).take(5).collect();
        assert_eq!(one_bit, [1, 0, 1, 1, 0]);
        let two_bit: Vec<_> = Samples::new(&[0b1110_0100], 2).collect();
        assert_eq!(two_bit, [3, 2, 1, 0]);
        let four_bit: Vec<_> = Samples::new(&[0xA5, 0x0F], 4).collect();
        assert_eq!(four_bit, [0xA, 0x5, 0x0, 0xF]);
        let sixteen: Vec<_> = Samples::new(&[0x12, 0x34, 0xAB], 16).collect();
        assert_eq!(sixteen, [0x1234]);
    }

    #[test]
    fn low_depths_scale_to_full_range() {
        assert_eq!(to_u8(1, 1), 255);
        assert_eq!(to_u8(2, 2), 170);
        assert_eq!(to_u8(15, 4), 255);
        assert_eq!(to_u8(0x80FF, 16), 0x80);
    }

    #[test]
    fn greyscale_key_becomes_transparent() {
        let header = ihdr(ColorType::Greyscale, 2);
        let decoder =
            PixelDecoder::new(&header, None, Some(Transparency::Greyscale(1))).unwrap();
        let pixels = decode(&decoder, &[0b0001_1011], 4);
        assert_eq!(
            pixels,
            [
                Pixel::new(0, 0, 0, 255),
                Pixel::new(85, 85, 85, 0),
                Pixel::new(170, 170, 170, 255),
                Pixel::new(255, 255, 255, 255),
            ]
        );
    }

    #[test]
    fn truecolor_sixteen_bit_keeps_high_bytes() {
        let header = ihdr(ColorType::Truecolor, 16);
        let decoder = PixelDecoder::new(
            &header,
            None,
            Some(Transparency::Truecolor([0x0102, 0x0304, 0x0506])),
        )
        .unwrap();
        let row = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0xFF, 0x00, 0x80, 0x01, 0x00, 0xFF];
        let pixels = decode(&decoder, &row, 2);
        assert_eq!(
            pixels,
            [Pixel::new(1, 3, 5, 0), Pixel::new(255, 128, 0, 255)]
        );
    }

    #[test]
    fn grey_alpha_and_rgba_pass_through() {
        let header = ihdr(ColorType::GreyscaleWithAlpha, 8);
        let decoder = PixelDecoder::new(&header, None, None).unwrap();
        assert_eq!(decode(&decoder, &[9, 99], 1), [Pixel::new(9, 9, 9, 99)]);

        let header = ihdr(ColorType::TruecolorWithAlpha, 8);
        let decoder = PixelDecoder::new(&header, None, None).unwrap();
        assert_eq!(decode(&decoder, &[1, 2, 3, 4], 1), [Pixel::new(1, 2, 3, 4)]);
    }

    #[test]
    fn indexed_pixels_use_palette_and_alpha() {
        let (_, palette) = PLTEChunk::from_bytes(&[10, 20, 30, 40, 50, 60]).unwrap();
        let header = ihdr(ColorType::IndexedColor, 4);
        let decoder = PixelDecoder::new(
            &header,
            Some(&palette),
            Some(Transparency::Palette(vec![77])),
        )
        .unwrap();
        assert_eq!(
            decode(&decoder, &[0x01, 0x10], 3),
            [
                Pixel::new(10, 20, 30, 77),
                Pixel::new(40, 50, 60, 255),
                Pixel::new(40, 50, 60, 255),
            ]
        );

        let mut out_of_range = vec![];
        let err = decoder
            .decode_row(&[0x20], 1, |_, p| out_of_range.push(p))
            .unwrap_err();
        assert!(matches!(err, DecodeError::PaletteIndex(2)));
    }

    #[test]
    fn indexed_without_palette_is_rejected() {
        let header = ihdr(ColorType::IndexedColor, 8);
        assert!(matches!(
            PixelDecoder::new(&header, None, None),
            Err(DecodeError::MissingPalette)
        ));
    }
}
