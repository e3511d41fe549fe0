/*!
    The capture loop.

    Each frame is acquired from the source, converted, and released before
    it is stored and previewed. Between frames the loop drains viewer events:
    the pointer position selects a pixel to report, escape or quit stops.
    Fixed probe points from the config are reported on every frame as well.
*/

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};

use sensor_sink::{FrameStore, save_png};
use sensor_source::FrameSource;
use sensor_transform::{convert, convert_cropped, depth_alpha, scale_to_u8, visualize_depth};
use sensor_types::{ElementType, ImageBuffer, PixelFormat};

use crate::config::{CaptureConfig, ErrorPolicy};
use crate::events::{ViewerEvent, ViewerState};

/**
    Value of the pixel under the pointer in one converted frame.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeReading {
    pub frame: usize,
    pub x: usize,
    pub y: usize,
    /// `None` when the pointer is outside the frame.
    pub values: Option<Vec<f64>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CaptureSummary {
    /// Frames converted and stored.
    pub converted: usize,
    /// Frames that failed conversion and were skipped.
    pub skipped: usize,
    /// True if the loop ended before the last frame.
    pub stopped_early: bool,
    /// Pixel readings, up to the configured maximum.
    pub probes: Vec<ProbeReading>,
    /// Readings logged but not kept in `probes`.
    pub dropped_readings: usize,
}

/**
    Run the capture loop over `source`, storing every converted frame.
*/
pub fn run_capture<S: FrameSource>(
    source: &mut S,
    store: &mut FrameStore,
    config: &CaptureConfig,
    events: &Receiver<ViewerEvent>,
) -> Result<CaptureSummary> {
    config.validate()?;
    if let Some(dir) = &config.preview_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create preview directory {}", dir.display()))?;
    }

    let count = source.frame_count();
    let limit = config.max_frames.unwrap_or(usize::MAX);
    let mut viewer = ViewerState::default();
    let mut summary = CaptureSummary::default();

    info!(frames = count, step = config.step, "starting capture");

    for index in (0..count).step_by(config.step) {
        viewer.drain(events);
        if viewer.stop {
            info!(index, "stop requested");
            summary.stopped_early = true;
            break;
        }
        if summary.converted >= limit {
            summary.stopped_early = true;
            break;
        }

        let frame = match source.acquire(index) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(index, error = %e, "failed to acquire frame, stopping");
                summary.stopped_early = true;
                break;
            }
        };

        let format = frame.descriptor.format;
        let converted = if config.crop_padding {
            convert_cropped(&frame.descriptor)
        } else {
            convert(&frame.descriptor)
        };
        drop(frame);

        let image = match converted {
            Ok(image) => image,
            Err(e) if config.on_error == ErrorPolicy::Skip => {
                warn!(index, %format, error = %e, "skipping frame");
                summary.skipped += 1;
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("failed to convert frame {index}")),
        };

        let name = config.frame_name(index);
        store
            .write(&name, &image)
            .with_context(|| format!("failed to store frame {name}"))?;

        if let Some(dir) = &config.preview_dir {
            let preview = preview_image(&image, format, config.max_depth_mm)?;
            let path = dir.join(format!("{name}.png"));
            save_png(&path, &preview)
                .with_context(|| format!("failed to write preview {}", path.display()))?;
        }

        let pointer = viewer.pointer.map(|p| [p.x, p.y]);
        for &[x, y] in config.probe_points.iter().chain(pointer.iter()) {
            let values = image.pixel_f64(y, x);
            match &values {
                Some(values) => info!(frame = index, x, y, ?values, "pixel"),
                None => debug!(frame = index, x, y, "pixel outside frame"),
            }
            if summary.probes.len() < config.max_readings {
                summary.probes.push(ProbeReading {
                    frame: index,
                    x,
                    y,
                    values,
                });
            } else {
                summary.dropped_readings += 1;
            }
        }

        debug!(index, %format, rows = image.rows(), cols = image.cols(), "converted frame");
        summary.converted += 1;
    }

    info!(
        converted = summary.converted,
        skipped = summary.skipped,
        stopped_early = summary.stopped_early,
        "capture finished"
    );
    Ok(summary)
}

/**
    Build the 8-bit image written as a preview.

    Depth is scaled so `max_depth_mm` is white; other 16-bit images use their
    full range. 8-bit images are previewed as they are.
*/
pub fn preview_image(image: &ImageBuffer, format: PixelFormat, max_depth_mm: f64) -> Result<ImageBuffer> {
    let preview = if format.is_depth() {
        visualize_depth(image, max_depth_mm)?
    } else {
        match image.element() {
            ElementType::U8 => image.clone(),
            ElementType::U16 => scale_to_u8(image, depth_alpha(u16::MAX as f64), 0.0)?,
            ElementType::F32 => scale_to_u8(image, depth_alpha(max_depth_mm), 0.0)?,
        }
    };
    Ok(preview)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{KEY_ESCAPE, PointerEvent, channel};
    use sensor_source::{MemoryFrame, MemorySource};

    fn depth_frame(values: &[u16], width: usize, pitch_pixels: usize) -> MemoryFrame {
        let mut bytes = Vec::new();
        for row in values.chunks(width) {
            for v in row {
                bytes.extend_from_slice(&v.to_ne_bytes());
            }
            bytes.resize(bytes.len() + (pitch_pixels - width) * 2, 0);
        }
        let height = values.len() / width;
        MemoryFrame::packed(PixelFormat::Depth, width, height, bytes, pitch_pixels * 2)
    }

    fn source() -> MemorySource {
        MemorySource::new(vec![
            depth_frame(&[100, 200, 300, 400], 2, 2),
            MemoryFrame::packed(PixelFormat::Yuy2, 2, 2, vec![0; 8], 4),
            depth_frame(&[1000, 2000, 3000, 4000], 2, 3),
        ])
    }

    #[test]
    fn converts_and_skips_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("frames.jsonl");
        let mut store = FrameStore::create(&store_path).unwrap();
        let (_tx, rx) = channel();

        let summary = run_capture(&mut source(), &mut store, &CaptureConfig::default(), &rx).unwrap();
        store.finish().unwrap();

        assert_eq!(summary.converted, 2);
        assert_eq!(summary.skipped, 1);
        assert!(!summary.stopped_early);

        let names: Vec<_> = FrameStore::read(&store_path)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["d0", "d2"]);

        // Padding of the last frame becomes an extra column
        let padded = FrameStore::find(&store_path, "d2").unwrap().unwrap();
        assert_eq!((padded.rows(), padded.cols()), (2, 3));
        assert_eq!(padded.sample::<u16>(1, 1, 0), Some(4000));
    }

    #[test]
    fn abort_policy_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FrameStore::create(dir.path().join("frames.jsonl")).unwrap();
        let (_tx, rx) = channel();
        let config = CaptureConfig {
            on_error: ErrorPolicy::Abort,
            ..CaptureConfig::default()
        };

        let err = run_capture(&mut source(), &mut store, &config, &rx).unwrap_err();
        assert!(err.to_string().contains("frame 1"), "{err}");
    }

    #[test]
    fn escape_stops_and_pointer_probes() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FrameStore::create(dir.path().join("frames.jsonl")).unwrap();
        let (tx, rx) = channel();
        tx.send(ViewerEvent::Pointer(PointerEvent::moved(1, 1))).unwrap();

        let config = CaptureConfig {
            crop_padding: true,
            ..CaptureConfig::default()
        };
        let mut source = MemorySource::new(vec![
            depth_frame(&[100, 200, 300, 400], 2, 4),
            depth_frame(&[1, 2, 3, 4], 2, 2),
        ]);

        // Escape arrives after the first frame was shown
        let summary = {
            let once = CaptureConfig {
                max_frames: Some(1),
                ..config.clone()
            };
            let first = run_capture(&mut source, &mut store, &once, &rx).unwrap();
            tx.send(ViewerEvent::Key(KEY_ESCAPE)).unwrap();
            let second = run_capture(&mut source, &mut store, &config, &rx).unwrap();
            (first, second)
        };

        assert_eq!(summary.0.converted, 1);
        assert_eq!(
            summary.0.probes,
            vec![ProbeReading {
                frame: 0,
                x: 1,
                y: 1,
                values: Some(vec![400.0]),
            }]
        );
        assert_eq!(summary.1.converted, 0);
        assert!(summary.1.stopped_early);
    }

    #[test]
    fn every_requested_pixel_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FrameStore::create(dir.path().join("frames.jsonl")).unwrap();
        let (tx, rx) = channel();
        tx.send(ViewerEvent::Pointer(PointerEvent::moved(1, 0))).unwrap();

        let config = CaptureConfig {
            probe_points: vec![[0, 0], [1, 0]],
            ..CaptureConfig::default()
        };
        let frame = MemoryFrame::packed(PixelFormat::Y8, 2, 1, vec![7, 9], 2);
        let mut source = MemorySource::new(vec![frame]);

        let summary = run_capture(&mut source, &mut store, &config, &rx).unwrap();
        let readings: Vec<_> = summary
            .probes
            .iter()
            .map(|r| (r.x, r.y, r.values.clone()))
            .collect();
        assert_eq!(
            readings,
            vec![
                (0, 0, Some(vec![7.0])),
                (1, 0, Some(vec![9.0])),
                (1, 0, Some(vec![9.0])),
            ]
        );
    }

    #[test]
    fn readings_are_capped() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FrameStore::create(dir.path().join("frames.jsonl")).unwrap();
        let (_tx, rx) = channel();

        let config = CaptureConfig {
            probe_points: vec![[0, 0]],
            max_readings: 2,
            ..CaptureConfig::default()
        };
        let frames = (0..5).map(|i| depth_frame(&[i], 1, 1)).collect();

        let summary = run_capture(&mut MemorySource::new(frames), &mut store, &config, &rx).unwrap();
        assert_eq!(summary.converted, 5);
        assert_eq!(summary.probes.len(), 2);
        assert_eq!(summary.probes[1].values, Some(vec![1.0]));
        assert_eq!(summary.dropped_readings, 3);
    }

    #[test]
    fn step_and_previews() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FrameStore::create(dir.path().join("frames.jsonl")).unwrap();
        let (_tx, rx) = channel();
        let preview_dir = dir.path().join("preview");
        let config = CaptureConfig {
            step: 2,
            preview_dir: Some(preview_dir.clone()),
            ..CaptureConfig::default()
        };

        let summary = run_capture(&mut source(), &mut store, &config, &rx).unwrap();
        assert_eq!(summary.converted, 2);
        assert_eq!(summary.skipped, 0);
        assert!(preview_dir.join("d0.png").exists());
        assert!(preview_dir.join("d2.png").exists());
    }

    #[test]
    fn preview_of_depth_is_bgr() {
        let image = ImageBuffer::from_bytes(
            sensor_types::PixelLayout {
                element: ElementType::U16,
                channels: 1,
            },
            1,
            1,
            4000u16.to_ne_bytes().to_vec(),
        )
        .unwrap();
        let preview = preview_image(&image, PixelFormat::Depth, 4000.0).unwrap();
        assert_eq!(preview.channels(), 3);
        assert_eq!(preview.as_bytes(), &[255, 255, 255]);
    }
}
