/*!
    Frame sources for the sensor frame crates.

    A source hands out one acquired frame at a time. The frame borrows the
    source, so its planes stay valid until it is dropped, which releases it.
    Recordings are replayed from a dump directory holding a JSON manifest and
    raw plane files.
*/

mod memory;
mod recording;
mod source;

pub use self::memory::{MemoryFrame, MemorySource};
pub use self::recording::{
    FormatTag, MANIFEST_FILE, Manifest, ManifestFrame, ManifestPlane, Recording, RecordingWriter,
};
pub use self::source::{AcquiredFrame, FrameSource, PlaneData, SourceInfo};
