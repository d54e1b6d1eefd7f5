use crate::{
    error::{Error, Result},
    PixMap, Pixel,
};

/// A 3×3 convolution kernel, row-major.
pub type Kernel = [[i32; 3]; 3];

pub const IDENTITY_KERNEL: Kernel = [[0, 0, 0], [0, 1, 0], [0, 0, 0]];

/// A filter plus its parameters.
///
/// Every variant computes one destination pixel purely from the source map and
/// the destination coordinates, so pixels can be produced in any order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Plugin {
    /// Nearest-neighbor rotation. Holds `sin`/`cos` of the negated angle.
    Rotate { sin: f32, cos: f32 },
    Convolution { kernel: Kernel },
    FlipHorizontal,
    FlipVertical,
}

impl Plugin {
    pub fn rotate(degrees: f32) -> Self {
        let radians = (-(degrees as f64)).to_radians();
        Self::Rotate {
            sin: radians.sin() as f32,
            cos: radians.cos() as f32,
        }
    }

    pub fn convolution(kernel: Kernel) -> Self {
        Self::Convolution { kernel }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rotate { .. } => "rotate",
            Self::Convolution { .. } => "convolution",
            Self::FlipHorizontal => "flipHorizontal",
            Self::FlipVertical => "flipVertical",
        }
    }

    /// Parses the filter named by `tokens[0]` and its arguments.
    ///
    /// Returns the plugin together with the number of tokens it consumed. The
    /// name may carry a leading `--`. An unrecognized name consumes nothing.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<(Self, usize)> {
        let Some(token) = tokens.first().map(AsRef::as_ref) else {
            return Err(Error::InvalidArgument {
                filter: "filter",
                message: "expected a filter name".to_owned(),
            });
        };
        let args = &tokens[1..];
        match token.strip_prefix("--").unwrap_or(token) {
            "rotate" => {
                let [degrees] = parse_args::<f32, 1, S>("rotate", args)?;
                Ok((Self::rotate(degrees), 2))
            }
            "convolution" => {
                let values = parse_args::<i32, 9, S>("convolution", args)?;
                let mut kernel = [[0; 3]; 3];
                for (cell, value) in kernel.iter_mut().flatten().zip(values) {
                    *cell = value;
                }
                Ok((Self::convolution(kernel), 10))
            }
            "flipHorizontal" => Ok((Self::FlipHorizontal, 1)),
            "flipVertical" => Ok((Self::FlipVertical, 1)),
            _ => Err(Error::UnknownFilter(token.to_owned())),
        }
    }

    /// Parses a whole command line worth of filters, in order.
    pub fn parse_all<S: AsRef<str>>(mut tokens: &[S]) -> Result<Vec<Self>> {
        let mut plugins = vec![];
        while !tokens.is_empty() {
            let (plugin, consumed) = Self::parse(tokens)?;
            log::debug!("Parsed {plugin:?}");
            plugins.push(plugin);
            tokens = &tokens[consumed..];
        }
        Ok(plugins)
    }

    /// Computes the destination pixel at (`row`, `col`) from `src`.
    pub fn pixel(&self, src: &PixMap, row: usize, col: usize) -> Result<Pixel> {
        match *self {
            Self::Rotate { sin, cos } => rotate(src, row, col, sin, cos),
            Self::Convolution { ref kernel } => convolve(src, row, col, kernel),
            Self::FlipHorizontal => src.get(row, src.width() - 1 - col),
            Self::FlipVertical => src.get(src.height() - 1 - row, col),
        }
    }
}

fn parse_args<T, const N: usize, S>(filter: &'static str, args: &[S]) -> Result<[T; N]>
where
    T: std::str::FromStr + Copy + Default,
    T::Err: std::fmt::Display,
    S: AsRef<str>,
{
    if args.len() < N {
        return Err(Error::InvalidArgument {
            filter,
            message: format!("expected {N} argument(s), got {}", args.len()),
        });
    }
    let mut values = [T::default(); N];
    for (value, arg) in values.iter_mut().zip(args) {
        let arg = arg.as_ref();
        *value = arg.parse().map_err(|err| Error::InvalidArgument {
            filter,
            message: format!("`{arg}`: {err}"),
        })?;
    }
    Ok(values)
}

fn rotate(src: &PixMap, row: usize, col: usize, sin: f32, cos: f32) -> Result<Pixel> {
    let ox = src.width() as f32 / 2.0;
    let oy = src.height() as f32 / 2.0;
    let (x, y) = (col as f32 - ox, oy - row as f32);
    let rot_x = cos * x - sin * y + ox;
    let rot_y = -(sin * x + cos * y - oy);
    let (src_col, src_row) = ((rot_x + 0.5).floor(), (rot_y + 0.5).floor());
    if src_row >= 0.0
        && src_col >= 0.0
        && (src_row as usize) < src.height()
        && (src_col as usize) < src.width()
    {
        src.get(src_row as usize, src_col as usize)
    } else {
        Ok(Pixel::TRANSPARENT)
    }
}

fn convolve(src: &PixMap, row: usize, col: usize, kernel: &Kernel) -> Result<Pixel> {
    let kernel_sum: i64 = kernel.iter().flatten().map(|&k| k as i64).sum();
    let max_row = src.height() as isize - 1;
    let max_col = src.width() as isize - 1;
    let mut acc = [0i64; 4];
    for dx in -1..=1isize {
        for dy in -1..=1isize {
            let sample_row = (row as isize + dx).clamp(0, max_row) as usize;
            let sample_col = (col as isize + dy).clamp(0, max_col) as usize;
            let weight = kernel[(dx + 1) as usize][(dy + 1) as usize] as i64;
            let channels = src.get(sample_row, sample_col)?.channels();
            for (acc, channel) in acc.iter_mut().zip(channels) {
                let product = channel as i64 * weight;
                // Zero-sum kernels (edge detectors) take magnitudes unnormalized.
                // Otherwise every term is divided on its own and the running
                // total truncated after each step.
                *acc = if kernel_sum == 0 {
                    acc.saturating_add(product.abs())
                } else {
                    (*acc as f32 + product as f32 / kernel_sum as f32) as i64
                };
            }
        }
    }
    Ok(Pixel::from_clamped(acc))
}
