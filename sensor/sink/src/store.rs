/*!
    Named matrix store.
*/

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use sensor_types::{ElementType, Error, ImageBuffer, PixelLayout, Result};

/**
    One stored frame, as written on a single line.

    `data` is the base64 of the image bytes in native byte order.
*/
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredFrame {
    pub name: String,
    pub rows: usize,
    pub cols: usize,
    pub channels: usize,
    pub element: String,
    pub data: String,
}

impl StoredFrame {
    pub fn encode(name: &str, image: &ImageBuffer) -> Self {
        Self {
            name: name.to_string(),
            rows: image.rows(),
            cols: image.cols(),
            channels: image.channels(),
            element: image.element().to_string(),
            data: STANDARD.encode(image.as_bytes()),
        }
    }

    pub fn decode(&self) -> Result<ImageBuffer> {
        let element: ElementType = self.element.parse()?;
        let data = STANDARD
            .decode(&self.data)
            .map_err(|e| Error::invalid_data(format!("frame '{}': {e}", self.name)))?;
        let layout = PixelLayout {
            element,
            channels: self.channels,
        };
        ImageBuffer::from_bytes(layout, self.rows, self.cols, data)
    }
}

/**
    An append-only file of named frames.

    Each call to [`FrameStore::write`] appends one JSON line, so a store cut
    short by a crash keeps every frame written before it.
*/
pub struct FrameStore {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl FrameStore {
    /**
        Create (or truncate) a store file.
    */
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(&path)?);
        Ok(Self {
            path,
            writer,
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /**
        Returns the number of frames written so far.
    */
    pub fn written(&self) -> usize {
        self.written
    }

    /**
        Append one named frame.
    */
    pub fn write(&mut self, name: &str, image: &ImageBuffer) -> Result<()> {
        let entry = StoredFrame::encode(name, image);
        serde_json::to_writer(&mut self.writer, &entry)
            .map_err(|e| Error::encode(format!("frame '{name}': {e}")))?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        tracing::trace!(name, rows = image.rows(), cols = image.cols(), "stored frame");
        Ok(())
    }

    /**
        Flush the file and return the number of frames written.
    */
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        Ok(self.written)
    }

    /**
        Read every entry of a store file, in write order.
    */
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Vec<StoredFrame>> {
        let reader = BufReader::new(File::open(path)?);
        let mut entries = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line)
                .map_err(|e| Error::invalid_data(format!("store line {}: {e}", number + 1)))?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /**
        Find and decode the frame stored under `name`.
    */
    pub fn find<P: AsRef<Path>>(path: P, name: &str) -> Result<Option<ImageBuffer>> {
        Self::read(path)?
            .into_iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.decode())
            .transpose()
    }
}

impl std::fmt::Debug for FrameStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameStore")
            .field("path", &self.path)
            .field("written", &self.written)
            .finish()
    }
}
