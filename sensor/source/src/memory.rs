/*!
    In-memory frame source.
*/

use std::time::Duration;

use sensor_types::{PixelFormat, Result, StreamKind};

use crate::source::{AcquiredFrame, FrameSource, PlaneData, SourceInfo, check_index, describe};

/**
    An owned frame held by a [`MemorySource`].
*/
#[derive(Clone, Debug)]
pub struct MemoryFrame {
    pub stream: StreamKind,
    pub format: PixelFormat,
    pub width: usize,
    pub height: usize,
    pub timestamp: Duration,
    pub planes: Vec<PlaneData>,
}

impl MemoryFrame {
    /**
        Create a single-plane frame. The stream is derived from the format.
    */
    pub fn packed(format: PixelFormat, width: usize, height: usize, bytes: Vec<u8>, pitch: usize) -> Self {
        Self {
            stream: format.stream_kind().unwrap_or(StreamKind::Color),
            format,
            width,
            height,
            timestamp: Duration::ZERO,
            planes: vec![PlaneData { bytes, pitch }],
        }
    }

    pub fn with_timestamp(mut self, timestamp: Duration) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_plane(mut self, bytes: Vec<u8>, pitch: usize) -> Self {
        self.planes.push(PlaneData { bytes, pitch });
        self
    }
}

/**
    A frame source backed by frames held in memory.
*/
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    frames: Vec<MemoryFrame>,
}

impl MemorySource {
    pub fn new(frames: Vec<MemoryFrame>) -> Self {
        Self { frames }
    }

    pub fn push(&mut self, frame: MemoryFrame) {
        self.frames.push(frame);
    }
}

impl FrameSource for MemorySource {
    fn info(&self) -> SourceInfo {
        let mut formats = Vec::new();
        for frame in &self.frames {
            if !formats.contains(&frame.format) {
                formats.push(frame.format);
            }
        }
        SourceInfo {
            origin: "memory".to_string(),
            frame_count: self.frames.len(),
            streams: self.frames.iter().map(|f| f.stream).collect(),
            formats,
        }
    }

    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn acquire(&mut self, index: usize) -> Result<AcquiredFrame<'_>> {
        check_index(index, self.frames.len())?;
        let frame = &self.frames[index];
        Ok(AcquiredFrame {
            index,
            stream: frame.stream,
            timestamp: frame.timestamp,
            descriptor: describe(frame.format, frame.width, frame.height, &frame.planes)?,
        })
    }
}
