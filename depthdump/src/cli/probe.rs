use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use sensor_sink::FrameStore;

#[derive(Parser, Debug)]
pub struct ProbeCommand {
    /// Store file written by `convert`
    pub store: PathBuf,

    /// Frame name, e.g. d0
    pub name: String,

    /// Column
    pub x: usize,

    /// Row
    pub y: usize,
}

impl ProbeCommand {
    pub fn run(self) -> Result<()> {
        let values = self.values()?;
        let values: Vec<_> = values.iter().map(|v| v.to_string()).collect();
        println!("{} ({}, {}): {}", self.name, self.x, self.y, values.join(" "));
        Ok(())
    }

    fn values(&self) -> Result<Vec<f64>> {
        let Some(image) = FrameStore::find(&self.store, &self.name)
            .with_context(|| format!("failed to read store {}", self.store.display()))?
        else {
            bail!("no frame named '{}' in {}", self.name, self.store.display());
        };
        match image.pixel_f64(self.y, self.x) {
            Some(values) => Ok(values),
            None => bail!(
                "({}, {}) is outside the {}x{} frame",
                self.x,
                self.y,
                image.cols(),
                image.rows()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor_types::{ElementType, ImageBuffer, PixelLayout};

    #[test]
    fn reads_stored_pixel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.jsonl");
        let layout = PixelLayout {
            element: ElementType::U8,
            channels: 3,
        };
        let image = ImageBuffer::from_bytes(layout, 1, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let mut store = FrameStore::create(&path).unwrap();
        store.write("c0", &image).unwrap();
        store.finish().unwrap();

        let probe = |name: &str, x, y| ProbeCommand {
            store: path.clone(),
            name: name.to_string(),
            x,
            y,
        };
        assert_eq!(probe("c0", 1, 0).values().unwrap(), vec![4.0, 5.0, 6.0]);
        assert!(probe("c0", 2, 0).values().is_err());
        assert!(probe("c1", 0, 0).values().is_err());
    }
}
