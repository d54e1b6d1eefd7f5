use super::DecodeError;

/// Per-scanline filter types. Arguments follow the PNG naming: `x` is the byte
/// being processed, `a` the corresponding byte of the pixel to the left, `b`
/// the byte above and `c` the byte above-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Filter {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}
impl Filter {
    fn predict(&self, a: u8, b: u8, c: u8) -> u8 {
        match self {
            Filter::None => 0,
            Filter::Sub => a,
            Filter::Up => b,
            Filter::Average => ((a as u16 + b as u16) / 2) as u8,
            Filter::Paeth => paeth_predictor(a, b, c),
        }
    }

    pub(crate) fn filter(&self, x: u8, a: u8, b: u8, c: u8) -> u8 {
        x.wrapping_sub(self.predict(a, b, c))
    }

    pub(crate) fn reconstruct(&self, x: u8, a: u8, b: u8, c: u8) -> u8 {
        x.wrapping_add(self.predict(a, b, c))
    }
}
impl TryFrom<u8> for Filter {
    type Error = DecodeError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Sub),
            2 => Ok(Self::Up),
            3 => Ok(Self::Average),
            4 => Ok(Self::Paeth),
            i => Err(DecodeError::UnknownFilter(i)),
        }
    }
}

fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Undoes scanline filtering. `data` holds whole scanlines of a filter-type
/// byte followed by `row_bytes` bytes; the result packs the unfiltered rows
/// back to back. `bpp` is the number of bytes per complete pixel (at least 1).
pub(crate) fn reconstruct_scanlines(
    data: &[u8],
    row_bytes: usize,
    bpp: usize,
) -> Result<Vec<u8>, DecodeError> {
    let height = data.len() / (row_bytes + 1);
    let mut out = vec![0u8; height * row_bytes];
    for (y, scanline) in data.chunks_exact(row_bytes + 1).enumerate() {
        let filter = Filter::try_from(scanline[0])?;
        let (done, rest) = out.split_at_mut(y * row_bytes);
        let prev = if y > 0 {
            Some(&done[(y - 1) * row_bytes..])
        } else {
            None
        };
        let row = &mut rest[..row_bytes];
        for i in 0..row_bytes {
            let a = if i >= bpp { row[i - bpp] } else { 0 };
            let b = prev.map_or(0, |prev| prev[i]);
            let c = match prev {
                Some(prev) if i >= bpp => prev[i - bpp],
                _ => 0,
            };
            row[i] = filter.reconstruct(scanline[1 + i], a, b, c);
        }
    }
    Ok(out)
}

/// Filters packed rows of `row_bytes` bytes with a single filter type,
/// prefixing every scanline with its filter-type byte.
pub(crate) fn filter_scanlines(data: &[u8], row_bytes: usize, bpp: usize, filter: Filter) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / row_bytes.max(1));
    let mut prev: Option<&[u8]> = None;
    for row in data.chunks_exact(row_bytes) {
        out.push(filter as u8);
        for (i, &x) in row.iter().enumerate() {
            let a = if i >= bpp { row[i - bpp] } else { 0 };
            let b = prev.map_or(0, |prev| prev[i]);
            let c = match prev {
                Some(prev) if i >= bpp => prev[i - bpp],
                _ => 0,
            };
            out.push(filter.filter(x, a, b, c));
        }
        prev = Some(row);
    }
    out
}
