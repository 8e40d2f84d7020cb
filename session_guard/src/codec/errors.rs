use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    #[error("Base64 error: {0}")]
    Base64(String),

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Truncated value stream")]
    Truncated,

    #[error("Unknown value tag: {0:#04x}")]
    UnknownTag(u8),

    #[error("Invalid UTF-8 in encoded string")]
    InvalidUtf8,

    #[error("Value nesting exceeds the supported depth")]
    DepthExceeded,

    #[error("Value too large to encode: {0} bytes")]
    Oversize(usize),
}
