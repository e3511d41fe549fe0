/*!
    Capture configuration.

    Settings come from an optional JSON file; command line flags override
    individual fields.
*/

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Deserializer};

use sensor_transform::DEFAULT_MAX_DEPTH_MM;
use sensor_types::StreamKind;

/**
    What to do with a frame that cannot be converted.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Log the frame and continue with the next one.
    #[default]
    Skip,
    /// Stop the capture with an error.
    Abort,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// Stream to convert; `None` converts every stream.
    #[serde(deserialize_with = "stream_from_str")]
    pub stream: Option<StreamKind>,
    /// Convert every n-th frame.
    pub step: usize,
    /// Stop after this many converted frames.
    pub max_frames: Option<usize>,
    /// Depth shown as white in previews, in millimeters.
    pub max_depth_mm: f64,
    /// Drop padding columns from converted frames.
    pub crop_padding: bool,
    pub on_error: ErrorPolicy,
    /// Stored frames are named `{prefix}{index}`.
    pub name_prefix: String,
    /// Directory for PNG previews.
    pub preview_dir: Option<PathBuf>,
    /// `[x, y]` pixels reported for every converted frame.
    pub probe_points: Vec<[usize; 2]>,
    /// Readings kept in the capture summary; later ones are only logged.
    pub max_readings: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            stream: Some(StreamKind::Depth),
            step: 1,
            max_frames: None,
            max_depth_mm: DEFAULT_MAX_DEPTH_MM,
            crop_padding: false,
            on_error: ErrorPolicy::Skip,
            name_prefix: "d".to_string(),
            preview_dir: None,
            probe_points: Vec::new(),
            max_readings: 1000,
        }
    }
}

impl CaptureConfig {
    /**
        Load a config file, filling missing fields with defaults.
    */
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.step >= 1, "step must be at least 1");
        ensure!(
            self.max_depth_mm.is_finite() && self.max_depth_mm > 0.0,
            "max depth must be positive, got {}",
            self.max_depth_mm
        );
        Ok(())
    }

    pub fn frame_name(&self, index: usize) -> String {
        format!("{}{index}", self.name_prefix)
    }
}

fn stream_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<StreamKind>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref() {
        None | Some("all") => Ok(None),
        Some(name) => name.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: CaptureConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.stream, Some(StreamKind::Depth));
        assert_eq!(config.step, 1);
        assert_eq!(config.max_depth_mm, 4000.0);
        assert_eq!(config.on_error, ErrorPolicy::Skip);
        assert_eq!(config.frame_name(7), "d7");
    }

    #[test]
    fn parses_fields() {
        let config: CaptureConfig = serde_json::from_str(
            r#"{"stream":"ir","step":3,"on_error":"abort","max_frames":10,"name_prefix":"ir"}"#,
        )
        .unwrap();
        assert_eq!(config.stream, Some(StreamKind::Ir));
        assert_eq!(config.step, 3);
        assert_eq!(config.on_error, ErrorPolicy::Abort);
        assert_eq!(config.max_frames, Some(10));

        let config: CaptureConfig = serde_json::from_str(r#"{"stream":"all"}"#).unwrap();
        assert_eq!(config.stream, None);

        let config: CaptureConfig =
            serde_json::from_str(r#"{"probe_points":[[0,0],[320,240]],"max_readings":5}"#).unwrap();
        assert_eq!(config.probe_points, vec![[0, 0], [320, 240]]);
        assert_eq!(config.max_readings, 5);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(serde_json::from_str::<CaptureConfig>(r#"{"stream":"thermal"}"#).is_err());
        assert!(serde_json::from_str::<CaptureConfig>(r#"{"fps":30}"#).is_err());

        let config = CaptureConfig {
            step: 0,
            ..CaptureConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
