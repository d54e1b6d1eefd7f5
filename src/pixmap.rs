use std::{ffi::OsString, fs, path::Path};

use crate::{
    bmp,
    error::{Error, Result},
    png, Pixel,
};

/// Diagnostic code reported when the input file itself can't be read.
const FILE_READ_ERROR_CODE: u32 = 78;

/// An owned RGBA raster stored row-major in one contiguous buffer.
///
/// `pixels.len() == width * height` always holds, and both dimensions are
/// non-zero. Cloning deep-copies the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixMap {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
}

impl PixMap {
    /// Allocates a `width × height` map filled with transparent black.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let len = checked_len(width, height)?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| Error::Allocation { width, height })?;
        pixels.resize(len, Pixel::TRANSPARENT);
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Pixel>) -> Result<Self> {
        let expected = checked_len(width, height)?;
        if pixels.len() != expected {
            return Err(Error::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<Pixel> {
        self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    pub fn get(&self, row: usize, col: usize) -> Result<Pixel> {
        let index = self.index(row, col)?;
        Ok(self.pixels[index])
    }

    pub fn set(&mut self, row: usize, col: usize, pixel: Pixel) -> Result<()> {
        let index = self.index(row, col)?;
        self.pixels[index] = pixel;
        Ok(())
    }

    pub fn row(&self, row: usize) -> Result<&[Pixel]> {
        let start = self.index(row, 0)?;
        Ok(&self.pixels[start..start + self.width])
    }

    pub fn rows(&self) -> std::slice::Chunks<'_, Pixel> {
        self.pixels.chunks(self.width)
    }

    fn index(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.height || col >= self.width {
            return Err(Error::OutOfBounds {
                row,
                col,
                width: self.width,
                height: self.height,
            });
        }
        Ok(row * self.width + col)
    }

    /// Decodes PNG bytes into a pixel map.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = png::decode(bytes)?;
        Self::from_pixels(image.width as usize, image.height as usize, image.pixels)
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|err| Error::Decode {
            code: FILE_READ_ERROR_CODE,
            message: format!("failed to read {}: {err}", path.display()),
        })?;
        log::debug!("Read {} bytes from {}", bytes.len(), path.display());
        Self::decode(&bytes)
    }

    /// Encodes the map as an 8-bit RGBA PNG.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let (width, height) = self.dimensions_u32()?;
        Ok(png::encode(width, height, &self.pixels)?)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        write_atomically(path.as_ref(), &self.encode()?)
    }

    /// Encodes the map as a 16-bit 5-6-5 BMP. Alpha is not retained.
    pub fn encode_bmp16(&self) -> Result<Vec<u8>> {
        let (width, height) = self.dimensions_u32()?;
        let rows = self.rows().rev().map(|row| row.iter().map(Pixel::to_rgb565));
        Ok(bmp::encode_rgb565(width, height, rows)?)
    }

    pub fn write_bmp16(&self, path: impl AsRef<Path>) -> Result<()> {
        write_atomically(path.as_ref(), &self.encode_bmp16()?)
    }

    fn dimensions_u32(&self) -> Result<(u32, u32)> {
        let too_large = || {
            Error::Encode(format!(
                "{}x{} exceeds the encodable size",
                self.width, self.height
            ))
        };
        Ok((
            u32::try_from(self.width).map_err(|_| too_large())?,
            u32::try_from(self.height).map_err(|_| too_large())?,
        ))
    }
}

fn checked_len(width: usize, height: usize) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::Allocation { width, height });
    }
    width
        .checked_mul(height)
        .filter(|len| len.checked_mul(std::mem::size_of::<Pixel>()).is_some())
        .ok_or(Error::Allocation { width, height })
}

/// Writes through a sibling temporary file so a failed write never leaves a
/// truncated file at `path`.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Encode(format!("{} is not a file path", path.display())))?;
    let mut temp_name = OsString::from(".");
    temp_name.push(file_name);
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    if let Err(err) = fs::write(&temp_path, bytes).and_then(|()| fs::rename(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::Encode(format!(
            "failed to write {}: {err}",
            path.display()
        )));
    }
    log::info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::PixMap;
    use crate::{Error, Pixel};

    fn gradient(width: usize, height: usize) -> PixMap {
        let pixels = (0..width * height)
            .map(|i| Pixel::new(i as u8, (i * 3) as u8, (i * 7) as u8, 255 - i as u8))
            .collect();
        PixMap::from_pixels(width, height, pixels).unwrap()
    }

    #[test]
    fn new_is_zeroed() {
        let map = PixMap::new(3, 2).unwrap();
        assert_eq!(map.pixels().len(), 6);
        assert!(map.pixels().iter().all(|p| *p == Pixel::TRANSPARENT));
    }

    #[test]
    fn zero_dimensions_fail_to_allocate() {
        assert!(matches!(
            PixMap::new(0, 4),
            Err(Error::Allocation {
                width: 0,
                height: 4
            })
        ));
        assert!(matches!(PixMap::new(4, 0), Err(Error::Allocation { .. })));
        assert!(matches!(
            PixMap::new(usize::MAX, 2),
            Err(Error::Allocation { .. })
        ));
    }

    #[test]
    fn from_pixels_checks_length() {
        assert!(matches!(
            PixMap::from_pixels(2, 2, vec![Pixel::default(); 3]),
            Err(Error::BufferSize {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn get_and_set_use_row_major_addressing() {
        let mut map = PixMap::new(3, 2).unwrap();
        let red = Pixel::opaque(255, 0, 0);
        map.set(1, 2, red).unwrap();
        assert_eq!(map.get(1, 2).unwrap(), red);
        assert_eq!(map.pixels()[5], red);
        assert_eq!(map.row(1).unwrap()[2], red);
    }

    #[test]
    fn access_outside_the_map_fails() {
        let mut map = gradient(4, 3);
        assert!(matches!(
            map.get(3, 0),
            Err(Error::OutOfBounds {
                row: 3,
                col: 0,
                width: 4,
                height: 3
            })
        ));
        assert!(matches!(map.get(0, 4), Err(Error::OutOfBounds { .. })));
        assert!(matches!(
            map.set(0, 4, Pixel::default()),
            Err(Error::OutOfBounds { .. })
        ));
        assert!(map.row(3).is_err());
    }

    #[test]
    fn clone_does_not_alias() {
        let original = gradient(3, 3);
        let mut copy = original.clone();
        assert_eq!(copy, original);
        copy.set(1, 1, Pixel::opaque(1, 2, 3)).unwrap();
        assert_ne!(copy, original);
        assert_eq!(original.get(1, 1).unwrap(), Pixel::new(4, 12, 28, 251));
    }

    #[test]
    fn png_round_trip_is_exact() {
        for (width, height) in [(1, 1), (5, 3), (2, 7)] {
            let map = gradient(width, height);
            let decoded = PixMap::decode(&map.encode().unwrap()).unwrap();
            assert_eq!(decoded, map);
        }
    }

    #[test]
    fn malformed_input_reports_code_and_message() {
        let err = PixMap::decode(b"definitely not a png").unwrap_err();
        match err {
            Error::Decode { code, message } => {
                assert_eq!(code, 28);
                assert!(message.contains("signature"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let err = PixMap::read("/nonexistent/dir/input.png").unwrap_err();
        assert!(matches!(err, Error::Decode { code: 78, .. }));
    }

    #[test]
    fn write_then_read_from_disk() {
        let dir = std::env::temp_dir().join(format!("pixmap-write-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("round_trip.png");
        let map = gradient(4, 4);
        map.write(&path).unwrap();
        assert_eq!(PixMap::read(&path).unwrap(), map);
        assert!(!dir.join(".round_trip.png.tmp").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn failed_write_leaves_nothing_behind() {
        let path = std::path::Path::new("/nonexistent/dir/output.png");
        let err = gradient(2, 2).write(path).unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
        assert!(!path.exists());
    }

    #[test]
    fn bmp16_is_bottom_up() {
        let map = PixMap::from_pixels(
            1,
            2,
            vec![Pixel::opaque(255, 0, 0), Pixel::opaque(0, 0, 255)],
        )
        .unwrap();
        let bytes = map.encode_bmp16().unwrap();
        let data = &bytes[66..];
        // Rows are padded to four bytes; the last grid row is stored first.
        assert_eq!(&data[0..2], &0x001Fu16.to_le_bytes());
        assert_eq!(&data[4..6], &0xF800u16.to_le_bytes());
    }
}
