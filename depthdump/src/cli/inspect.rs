use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use sensor_source::{FrameSource, Recording};
use sensor_transform::convert;

#[derive(Parser, Debug)]
pub struct InspectCommand {
    /// Recording directory
    pub recording: PathBuf,
}

impl InspectCommand {
    pub fn run(self) -> Result<()> {
        let mut recording = Recording::open(&self.recording)
            .with_context(|| format!("failed to open recording {}", self.recording.display()))?;

        let info = recording.info();
        println!("Recording: {}", info.origin);
        if let Some(device) = recording.device() {
            println!("  Device: {device}");
        }
        println!("  Frames: {}", info.frame_count);
        let streams: Vec<_> = info.streams.iter().map(|s| s.to_string()).collect();
        println!("  Streams: {}", streams.join(", "));
        let formats: Vec<_> = info.formats.iter().map(|f| f.to_string()).collect();
        println!("  Formats: {}", formats.join(", "));
        println!();

        for line in frame_report(&mut recording) {
            println!("{line}");
        }
        Ok(())
    }
}

/**
    One line per frame: its stream, format and size, and what converting it
    gives.
*/
fn frame_report<S: FrameSource>(source: &mut S) -> Vec<String> {
    (0..source.frame_count())
        .map(|index| match source.acquire(index) {
            Ok(frame) => {
                let d = frame.descriptor;
                let outcome = match convert(&d) {
                    Ok(image) => format!(
                        "ok, {}x{} {}x{}",
                        image.cols(),
                        image.rows(),
                        image.element(),
                        image.channels()
                    ),
                    Err(e) => format!("not converted: {e}"),
                };
                format!(
                    "  [{index:5}] {:<5} {:<16} {}x{}  {outcome}",
                    frame.stream.to_string(),
                    d.format.to_string(),
                    d.width,
                    d.height
                )
            }
            Err(e) => format!("  [{index:5}] failed to acquire: {e}"),
        })
        .collect()
}
