//! Nearest-neighbor rotation, 3×3 convolution and flips over RGBA pixel
//! maps, with an in-crate PNG codec and a 16-bit 5-6-5 BMP writer.
mod bmp;
pub mod engine;
mod error;
mod pixel;
mod pixmap;
pub mod plugin;
pub mod png;

pub use engine::Execution;
pub use error::{Error, Result};
pub use pixel::Pixel;
pub use pixmap::PixMap;
pub use plugin::{Kernel, Plugin};
