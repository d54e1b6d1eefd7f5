#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash)]
pub struct Pixel {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}
impl Pixel {
    /// Fully transparent black, written wherever a filter has nothing to sample.
    pub const TRANSPARENT: Pixel = Pixel::new(0, 0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub const fn opaque(red: u8, green: u8, blue: u8) -> Self {
        Self::new(red, green, blue, u8::MAX)
    }

    pub fn channels(&self) -> [u8; 4] {
        [self.red, self.green, self.blue, self.alpha]
    }

    /// Builds a pixel from wide accumulators, clamping every channel into `0..=255`.
    pub fn from_clamped([red, green, blue, alpha]: [i64; 4]) -> Self {
        let clamp = |v: i64| v.clamp(0, u8::MAX as i64) as u8;
        Self::new(clamp(red), clamp(green), clamp(blue), clamp(alpha))
    }

    /// Packs the color into a 16-bit 5-6-5 value, keeping the top bits of each
    /// channel. Alpha is dropped.
    pub fn to_rgb565(&self) -> u16 {
        let red = (self.red as u16 >> (8 - RGB565_BITS.0)) << 11;
        let green = (self.green as u16 >> (8 - RGB565_BITS.1)) << 5;
        let blue = self.blue as u16 >> (8 - RGB565_BITS.2);
        red | green | blue
    }
}
impl From<[u8; 4]> for Pixel {
    fn from([red, green, blue, alpha]: [u8; 4]) -> Self {
        Self::new(red, green, blue, alpha)
    }
}

/// Bits kept per channel (red, green, blue) in the reduced-color format.
pub const RGB565_BITS: (u16, u16, u16) = (5, 6, 5);
