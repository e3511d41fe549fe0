use thiserror::Error;

use crate::PixelFormat;

/**
    Errors produced while handling sensor frames.

    `UnsupportedFormat` and `UnsupportedLayout` are the two ways a frame can be
    rejected by the transcoder. Both are final for that frame: callers should
    skip it rather than look at any buffer contents.
*/
#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported pixel format {0}")]
    UnsupportedFormat(PixelFormat),

    #[error("unsupported layout: {0}")]
    UnsupportedLayout(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("encoding failed: {0}")]
    Encode(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn unsupported_layout(message: impl Into<String>) -> Self {
        Self::UnsupportedLayout(message.into())
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }

    /**
        Returns true for the errors that reject a frame's format or layout,
        as opposed to I/O or malformed input.
    */
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedFormat(_) | Self::UnsupportedLayout(_))
    }
}

/**
    Error returned by `FromStr` implementations on enum types.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
