use crate::png;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("error {code}: {message}")]
    Decode { code: u32, message: String },
    #[error("failed to encode image: {0}")]
    Encode(String),
    #[error("cannot allocate a {width}x{height} pixel map")]
    Allocation { width: usize, height: usize },
    #[error("pixel buffer holds {actual} pixels, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("pixel ({row}, {col}) is outside a {width}x{height} pixel map")]
    OutOfBounds {
        row: usize,
        col: usize,
        width: usize,
        height: usize,
    },
    #[error("unknown filter `{0}`")]
    UnknownFilter(String),
    #[error("invalid argument for {filter}: {message}")]
    InvalidArgument {
        filter: &'static str,
        message: String,
    },
}

impl From<png::DecodeError> for Error {
    fn from(err: png::DecodeError) -> Self {
        Self::Decode {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl From<png::EncodeError> for Error {
    fn from(err: png::EncodeError) -> Self {
        Self::Encode(err.to_string())
    }
}
