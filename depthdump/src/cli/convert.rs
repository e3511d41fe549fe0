use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;

use sensor_sink::FrameStore;
use sensor_source::{FrameSource, Recording};

use crate::capture::run_capture;
use crate::config::{CaptureConfig, ErrorPolicy};
use crate::events::{self, PointerEvent, ViewerEvent};

#[derive(Parser, Debug)]
pub struct ConvertCommand {
    /// Recording directory
    pub recording: PathBuf,

    /// Output store file
    #[arg(short, long, default_value = "frames.jsonl")]
    pub store: PathBuf,

    /// JSON config file; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write PNG previews to this directory
    #[arg(long)]
    pub preview_dir: Option<PathBuf>,

    /// Stream to convert (color, depth, ir or all)
    #[arg(long)]
    pub stream: Option<String>,

    /// Convert every n-th frame
    #[arg(long)]
    pub step: Option<usize>,

    /// Stop after this many converted frames
    #[arg(long)]
    pub max_frames: Option<usize>,

    /// Depth shown as white in previews, in millimeters
    #[arg(long)]
    pub max_depth_mm: Option<f64>,

    /// Drop padding columns from converted frames
    #[arg(long)]
    pub crop: bool,

    /// What to do with frames that cannot be converted
    #[arg(long, value_enum)]
    pub on_error: Option<ErrorPolicy>,

    /// Report the pixel at X,Y of every converted frame
    #[arg(long)]
    pub probe: Vec<PointerEvent>,
}

impl ConvertCommand {
    pub fn run(self) -> Result<()> {
        let config = self.config()?;
        config.validate()?;

        let mut recording = Recording::open(&self.recording)
            .with_context(|| format!("failed to open recording {}", self.recording.display()))?;
        if let Some(stream) = config.stream {
            recording = recording.with_stream(stream);
        }

        let info = recording.info();
        println!("Recording: {}", info.origin);
        println!("  Frames: {}", info.frame_count);

        let mut store = FrameStore::create(&self.store)
            .with_context(|| format!("failed to create store {}", self.store.display()))?;

        let (quit, rx) = events::channel();
        if let Err(e) = ctrlc::set_handler(move || {
            let _ = quit.send(ViewerEvent::Quit);
        }) {
            warn!(error = %e, "failed to install interrupt handler");
        }

        let summary = run_capture(&mut recording, &mut store, &config, &rx)?;
        let written = store.finish()?;

        println!("  Converted: {}", summary.converted);
        println!("  Skipped: {}", summary.skipped);
        if summary.stopped_early {
            println!("  Stopped early");
        }
        if summary.dropped_readings > 0 {
            println!("  Readings not listed: {}", summary.dropped_readings);
        }
        for reading in &summary.probes {
            match &reading.values {
                Some(values) => println!(
                    "  Frame {} ({}, {}): {:?}",
                    reading.frame, reading.x, reading.y, values
                ),
                None => println!(
                    "  Frame {} ({}, {}): outside frame",
                    reading.frame, reading.x, reading.y
                ),
            }
        }
        println!("Wrote {} frame(s) to {}", written, self.store.display());
        Ok(())
    }

    fn config(&self) -> Result<CaptureConfig> {
        let mut config = match &self.config {
            Some(path) => CaptureConfig::load(path)?,
            None => CaptureConfig::default(),
        };

        if let Some(stream) = &self.stream {
            config.stream = match stream.as_str() {
                "all" => None,
                name => Some(name.parse()?),
            };
        }
        if let Some(step) = self.step {
            config.step = step;
        }
        if self.max_frames.is_some() {
            config.max_frames = self.max_frames;
        }
        if let Some(max_depth_mm) = self.max_depth_mm {
            config.max_depth_mm = max_depth_mm;
        }
        if self.crop {
            config.crop_padding = true;
        }
        if let Some(on_error) = self.on_error {
            config.on_error = on_error;
        }
        if self.preview_dir.is_some() {
            config.preview_dir = self.preview_dir.clone();
        }
        config
            .probe_points
            .extend(self.probe.iter().map(|p| [p.x, p.y]));
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor_types::StreamKind;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"stream":"ir","step":4,"max_depth_mm":2000}"#).unwrap();

        let cmd = ConvertCommand::try_parse_from([
            "convert",
            "rec",
            "--config",
            path.to_str().unwrap(),
            "--step",
            "2",
            "--crop",
        ])
        .unwrap();
        let config = cmd.config().unwrap();

        assert_eq!(config.stream, Some(StreamKind::Ir));
        assert_eq!(config.step, 2);
        assert_eq!(config.max_depth_mm, 2000.0);
        assert!(config.crop_padding);
    }

    #[test]
    fn repeated_pixel_flags_are_kept() {
        let cmd =
            ConvertCommand::try_parse_from(["convert", "rec", "--probe", "0,0", "--probe", "1,0"]).unwrap();
        assert_eq!(cmd.config().unwrap().probe_points, vec![[0, 0], [1, 0]]);
    }

    #[test]
    fn all_streams() {
        let cmd = ConvertCommand::try_parse_from(["convert", "rec", "--stream", "all"]).unwrap();
        assert_eq!(cmd.config().unwrap().stream, None);

        let cmd = ConvertCommand::try_parse_from(["convert", "rec", "--stream", "thermal"]).unwrap();
        assert!(cmd.config().is_err());
    }
}
