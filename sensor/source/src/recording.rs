/*!
    Recording dump playback.

    A recording dump is a directory holding `manifest.json` and one raw file
    per frame plane:

    ```text
    recording/
        manifest.json
        frame_00000_p0.raw
        frame_00001_p0.raw
    ```
*/

use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use sensor_types::{Error, MAX_PLANES, PixelFormat, Result, StreamKind};

use crate::source::{AcquiredFrame, FrameSource, PlaneData, SourceInfo, check_index, describe};

/// Name of the manifest file inside a recording directory.
pub const MANIFEST_FILE: &str = "manifest.json";

const MANIFEST_VERSION: u32 = 1;

/**
    The JSON manifest of a recording dump.
*/
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Device the recording was captured with, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    pub frames: Vec<ManifestFrame>,
}

fn default_version() -> u32 {
    MANIFEST_VERSION
}

/**
    One frame entry of a manifest.
*/
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManifestFrame {
    /// Stream name: `color`, `depth` or `ir`.
    pub stream: String,
    pub format: FormatTag,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub timestamp_us: u64,
    pub planes: Vec<ManifestPlane>,
}

/**
    One plane file of a manifest frame.
*/
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManifestPlane {
    /// File name, relative to the recording directory.
    pub file: String,
    /// Byte distance between rows.
    pub pitch: usize,
}

/**
    A pixel format as written in a manifest: a name or a raw SDK code.
*/
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormatTag {
    Code(u32),
    Name(String),
}

impl FormatTag {
    pub fn resolve(&self) -> Result<PixelFormat> {
        match self {
            Self::Code(code) => Ok(PixelFormat::from_sdk_code(*code)),
            Self::Name(name) => Ok(name.parse()?),
        }
    }
}

impl From<PixelFormat> for FormatTag {
    fn from(format: PixelFormat) -> Self {
        match format {
            PixelFormat::Other(code) => Self::Code(code),
            named => Self::Name(named.to_string()),
        }
    }
}

#[derive(Clone, Debug)]
struct FrameRecord {
    stream: StreamKind,
    format: PixelFormat,
    width: usize,
    height: usize,
    timestamp: Duration,
    planes: Vec<(PathBuf, usize)>,
}

/**
    A frame source replaying a recording dump directory.
*/
#[derive(Debug)]
pub struct Recording {
    root: PathBuf,
    device: Option<String>,
    records: Vec<FrameRecord>,
    scratch: Vec<PlaneData>,
}

impl Recording {
    /**
        Open a recording directory and validate its manifest.

        Plane files are only read when a frame is acquired.
    */
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let manifest_path = root.join(MANIFEST_FILE);
        let text = fs::read_to_string(&manifest_path)?;
        let manifest: Manifest = serde_json::from_str(&text).map_err(|e| {
            Error::invalid_data(format!("{}: {e}", manifest_path.display()))
        })?;

        if manifest.version != MANIFEST_VERSION {
            return Err(Error::invalid_data(format!(
                "unsupported manifest version {}",
                manifest.version
            )));
        }

        let records = manifest
            .frames
            .iter()
            .enumerate()
            .map(|(index, frame)| {
                record_from_manifest(&root, frame)
                    .map_err(|e| Error::invalid_data(format!("manifest frame {index}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            path = %root.display(),
            frames = records.len(),
            "opened recording"
        );

        Ok(Self {
            root,
            device: manifest.device,
            records,
            scratch: Vec::new(),
        })
    }

    /**
        Keep only frames of the given stream.
    */
    pub fn with_stream(mut self, stream: StreamKind) -> Self {
        self.records.retain(|r| r.stream == stream);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    /**
        Returns the format, width and height of the frame at `index` without
        reading its planes.
    */
    pub fn frame_header(&self, index: usize) -> Option<(StreamKind, PixelFormat, usize, usize)> {
        self.records
            .get(index)
            .map(|r| (r.stream, r.format, r.width, r.height))
    }
}

fn record_from_manifest(root: &Path, frame: &ManifestFrame) -> Result<FrameRecord> {
    let stream = frame.stream.parse()?;
    let format = frame.format.resolve()?;

    if frame.planes.is_empty() || frame.planes.len() > MAX_PLANES {
        return Err(Error::invalid_data(format!(
            "expected 1 to {MAX_PLANES} planes, found {}",
            frame.planes.len()
        )));
    }

    Ok(FrameRecord {
        stream,
        format,
        width: frame.width,
        height: frame.height,
        timestamp: Duration::from_micros(frame.timestamp_us),
        planes: frame
            .planes
            .iter()
            .map(|p| -> Result<(PathBuf, usize)> { Ok((plane_path(root, &p.file)?, p.pitch)) })
            .collect::<Result<_>>()?,
    })
}

/**
    Resolve a plane file name inside the recording directory.

    Only plain relative names are accepted: absolute paths and `..` could
    point outside the recording.
*/
fn plane_path(root: &Path, file: &str) -> Result<PathBuf> {
    let relative = Path::new(file);
    let inside = relative.components().next().is_some()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !inside {
        return Err(Error::invalid_data(format!(
            "plane file '{file}' is outside the recording"
        )));
    }
    Ok(root.join(relative))
}

impl FrameSource for Recording {
    fn info(&self) -> SourceInfo {
        let mut formats = Vec::new();
        for record in &self.records {
            if !formats.contains(&record.format) {
                formats.push(record.format);
            }
        }
        SourceInfo {
            origin: self.root.display().to_string(),
            frame_count: self.records.len(),
            streams: self.records.iter().map(|r| r.stream).collect(),
            formats,
        }
    }

    fn frame_count(&self) -> usize {
        self.records.len()
    }

    fn acquire(&mut self, index: usize) -> Result<AcquiredFrame<'_>> {
        check_index(index, self.records.len())?;
        let record = &self.records[index];

        self.scratch.resize_with(record.planes.len(), PlaneData::default);
        for ((path, pitch), plane) in record.planes.iter().zip(self.scratch.iter_mut()) {
            plane.bytes.clear();
            File::open(path)?.read_to_end(&mut plane.bytes)?;
            plane.pitch = *pitch;
        }

        tracing::debug!(
            index,
            format = %record.format,
            width = record.width,
            height = record.height,
            "acquired frame"
        );

        Ok(AcquiredFrame {
            index,
            stream: record.stream,
            timestamp: record.timestamp,
            descriptor: describe(record.format, record.width, record.height, &self.scratch)?,
        })
    }
}

/**
    Writes a recording dump directory.

    Plane files are written as frames are pushed; the manifest is written by
    [`RecordingWriter::finish`].
*/
#[derive(Debug)]
pub struct RecordingWriter {
    root: PathBuf,
    manifest: Manifest,
}

impl RecordingWriter {
    /**
        Create the directory (if needed) and start an empty recording.
    */
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            manifest: Manifest {
                version: MANIFEST_VERSION,
                device: None,
                frames: Vec::new(),
            },
        })
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.manifest.device = Some(device.into());
        self
    }

    /**
        Append one frame. `planes` holds each plane's bytes and pitch.
    */
    pub fn push(
        &mut self,
        stream: StreamKind,
        format: PixelFormat,
        width: usize,
        height: usize,
        timestamp: Duration,
        planes: &[(&[u8], usize)],
    ) -> Result<()> {
        let index = self.manifest.frames.len();
        let mut entries = Vec::with_capacity(planes.len());
        for (plane, (bytes, pitch)) in planes.iter().enumerate() {
            let file = format!("frame_{index:05}_p{plane}.raw");
            fs::write(self.root.join(&file), bytes)?;
            entries.push(ManifestPlane {
                file,
                pitch: *pitch,
            });
        }

        self.manifest.frames.push(ManifestFrame {
            stream: stream.to_string(),
            format: format.into(),
            width,
            height,
            timestamp_us: timestamp.as_micros() as u64,
            planes: entries,
        });
        Ok(())
    }

    /**
        Write the manifest and return the recording directory.
    */
    pub fn finish(self) -> Result<PathBuf> {
        let text = serde_json::to_string_pretty(&self.manifest)
            .map_err(|e| Error::invalid_data(format!("failed to encode manifest: {e}")))?;
        fs::write(self.root.join(MANIFEST_FILE), text)?;
        Ok(self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_sample(dir: &Path) -> PathBuf {
        let depth: &[u8] = &[1, 0, 2, 0, 3, 0, 4, 0];
        let luma: &[u8] = &[0; 4];
        let chroma: &[u8] = &[0; 2];

        let mut writer = RecordingWriter::create(dir).unwrap().with_device("test rig");
        writer
            .push(
                StreamKind::Depth,
                PixelFormat::Depth,
                2,
                2,
                Duration::from_millis(0),
                &[(depth, 4)],
            )
            .unwrap();
        writer
            .push(
                StreamKind::Color,
                PixelFormat::Nv12,
                2,
                2,
                Duration::from_millis(33),
                &[(luma, 2), (chroma, 2)],
            )
            .unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn round_trips_through_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_sample(dir.path());

        let mut recording = Recording::open(&root).unwrap();
        assert_eq!(recording.frame_count(), 2);
        assert_eq!(recording.device(), Some("test rig"));
        assert_eq!(
            recording.frame_header(1),
            Some((StreamKind::Color, PixelFormat::Nv12, 2, 2))
        );

        let frame = recording.acquire(0).unwrap();
        assert_eq!(frame.stream, StreamKind::Depth);
        assert_eq!(frame.descriptor.format, PixelFormat::Depth);
        assert_eq!(frame.descriptor.planes[0], Some(&[1u8, 0, 2, 0, 3, 0, 4, 0][..]));
        drop(frame);

        let frame = recording.acquire(1).unwrap();
        assert_eq!(frame.descriptor.plane_count(), 2);
        assert_eq!(frame.timestamp, Duration::from_millis(33));
    }

    #[test]
    fn filters_by_stream() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_sample(dir.path());

        let recording = Recording::open(&root).unwrap().with_stream(StreamKind::Depth);
        assert_eq!(recording.frame_count(), 1);
        assert_eq!(recording.info().formats, vec![PixelFormat::Depth]);
    }

    #[test]
    fn accepts_sdk_codes_and_rejects_bad_entries() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.raw"), [0u8; 4]).unwrap();

        let manifest = r#"{"frames":[{"stream":"ir","format":262144,"width":2,"height":1,"planes":[{"file":"a.raw","pitch":4}]}]}"#;
        fs::write(dir.path().join(MANIFEST_FILE), manifest).unwrap();
        let recording = Recording::open(dir.path()).unwrap();
        assert_eq!(
            recording.frame_header(0),
            Some((StreamKind::Ir, PixelFormat::Y16, 2, 1))
        );

        let manifest = r#"{"frames":[{"stream":"thermal","format":"y8","width":2,"height":1,"planes":[{"file":"a.raw","pitch":2}]}]}"#;
        fs::write(dir.path().join(MANIFEST_FILE), manifest).unwrap();
        assert!(Recording::open(dir.path()).is_err());

        let manifest = r#"{"frames":[{"stream":"ir","format":"y8","width":2,"height":1,"planes":[]}]}"#;
        fs::write(dir.path().join(MANIFEST_FILE), manifest).unwrap();
        assert!(Recording::open(dir.path()).is_err());
    }

    #[test]
    fn plane_files_stay_inside_the_recording() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("rec");
        fs::create_dir(&root).unwrap();
        fs::write(dir.path().join("secret.raw"), [0u8; 2]).unwrap();

        for file in ["../secret.raw", "/etc/passwd", "planes/../../secret.raw", ""] {
            let manifest = format!(
                r#"{{"frames":[{{"stream":"ir","format":"y8","width":2,"height":1,"planes":[{{"file":"{file}","pitch":2}}]}}]}}"#
            );
            fs::write(root.join(MANIFEST_FILE), manifest).unwrap();
            assert!(
                matches!(Recording::open(&root), Err(Error::InvalidData(_))),
                "{file}"
            );
        }

        assert_eq!(
            plane_path(&root, "planes/./a.raw").unwrap(),
            root.join("planes/./a.raw")
        );
    }

    #[test]
    fn missing_plane_file_fails_acquire() {
        let dir = tempfile::tempdir().unwrap();
        let root = write_sample(dir.path());
        fs::remove_file(root.join("frame_00000_p0.raw")).unwrap();

        let mut recording = Recording::open(&root).unwrap();
        assert!(matches!(recording.acquire(0), Err(Error::Io(_))));
    }
}
