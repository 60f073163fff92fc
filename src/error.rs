//! Error types for QR symbol construction and rendering.

use thiserror::Error;

/// Errors surfaced by the encoding pipeline and the renderers.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied parameter failed validation before any mutation
    /// took place (module size below 1, malformed colour string, unknown
    /// character set label, version out of range).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The input does not fit under the given constraints: the maximum
    /// version was reached with structured append disabled, or splitting
    /// would require more than 16 symbols.
    #[error("data capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// A character cannot be represented in the configured byte-mode
    /// character set (and no other mode accepts it).
    #[error("character {0:?} is not representable in charset {1}")]
    EncodingFailed(char, &'static str),

    /// An I/O failure while saving a bitmap. Only returned by `save_*`.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A failure decoding the generated DIB into an in-memory image. Only
    /// returned by `get_*_image`.
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
