/*!
    Shared types for the sensor frame crates.

    This crate defines the vocabulary that crosses crate boundaries: pixel
    formats as tagged by the sensor SDK, borrowed frame descriptors and the
    owned packed image buffers produced from them. It performs no I/O.
*/

mod error;
mod format;
mod frame;
mod image;

pub use self::error::{Error, ParseError, Result};
pub use self::format::{ElementType, PixelFormat, PixelLayout, StreamKind};
pub use self::frame::{FrameDescriptor, MAX_PLANES};
pub use self::image::{ImageBuffer, Sample};
