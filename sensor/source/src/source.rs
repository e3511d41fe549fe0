/*!
    The frame source abstraction.
*/

use std::collections::BTreeSet;
use std::time::Duration;

use sensor_types::{Error, FrameDescriptor, MAX_PLANES, PixelFormat, Result, StreamKind};

/**
    Summary information about a frame source.
*/
#[derive(Clone, Debug, Default)]
pub struct SourceInfo {
    /// Human readable origin (a path, or "memory").
    pub origin: String,
    /// Number of frames available.
    pub frame_count: usize,
    /// Streams present in the source.
    pub streams: BTreeSet<StreamKind>,
    /// Pixel formats present in the source.
    pub formats: Vec<PixelFormat>,
}

/**
    One acquired frame.

    Holds a shared borrow of its source's plane memory; dropping it releases
    the frame and lets the source be acquired again.
*/
#[derive(Debug)]
pub struct AcquiredFrame<'a> {
    /// Position of the frame in the source.
    pub index: usize,
    /// Stream the frame belongs to.
    pub stream: StreamKind,
    /// Capture time relative to the start of the recording.
    pub timestamp: Duration,
    /// Format, dimensions and plane memory.
    pub descriptor: FrameDescriptor<'a>,
}

/**
    Something that produces tagged pixel buffers, one frame at a time.
*/
pub trait FrameSource {
    /**
        Returns information about this source.
    */
    fn info(&self) -> SourceInfo;

    /**
        Returns the number of frames that can be acquired.
    */
    fn frame_count(&self) -> usize;

    /**
        Acquire the frame at `index`.

        The returned frame borrows the source mutably, so only one frame can
        be held at a time.
    */
    fn acquire(&mut self, index: usize) -> Result<AcquiredFrame<'_>>;
}

/**
    Owned memory of one plane, with its row pitch.
*/
#[derive(Clone, Debug, Default)]
pub struct PlaneData {
    pub bytes: Vec<u8>,
    pub pitch: usize,
}

/**
    Build a descriptor borrowing the given planes.
*/
pub(crate) fn describe<'a>(
    format: PixelFormat,
    width: usize,
    height: usize,
    planes: &'a [PlaneData],
) -> Result<FrameDescriptor<'a>> {
    let Some((first, rest)) = planes.split_first() else {
        return Err(Error::invalid_data("frame has no planes"));
    };
    if planes.len() > MAX_PLANES {
        return Err(Error::invalid_data(format!(
            "frame has {} planes, at most {MAX_PLANES} are supported",
            planes.len()
        )));
    }

    let mut descriptor = FrameDescriptor::packed(format, width, height, &first.bytes, first.pitch);
    for (offset, plane) in rest.iter().enumerate() {
        descriptor = descriptor.with_plane(offset + 1, &plane.bytes, plane.pitch);
    }
    Ok(descriptor)
}

pub(crate) fn check_index(index: usize, count: usize) -> Result<()> {
    if index >= count {
        return Err(Error::invalid_data(format!(
            "frame index {index} out of range, source has {count} frames"
        )));
    }
    Ok(())
}
