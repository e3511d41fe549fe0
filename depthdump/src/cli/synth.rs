use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail, ensure};
use clap::Parser;

use sensor_source::RecordingWriter;
use sensor_types::{ElementType, PixelFormat, StreamKind};

/// Frame interval of synthetic recordings (30 fps).
const FRAME_INTERVAL: Duration = Duration::from_micros(33_333);

#[derive(Parser, Debug)]
pub struct SynthCommand {
    /// Output recording directory
    pub dir: PathBuf,

    /// Pixel format name or 0x-prefixed SDK code
    #[arg(short, long, default_value = "depth")]
    pub format: PixelFormat,

    #[arg(long, default_value = "640")]
    pub width: usize,

    #[arg(long, default_value = "480")]
    pub height: usize,

    /// Padding pixels at the end of every row
    #[arg(long, default_value = "0")]
    pub pad: usize,

    /// Number of frames
    #[arg(short = 'n', long, default_value = "10")]
    pub frames: usize,
}

impl SynthCommand {
    pub fn run(self) -> Result<()> {
        let dir = self.write()?;
        println!(
            "Wrote {} {} frame(s) of {}x{} to {}",
            self.frames,
            self.format,
            self.width,
            self.height,
            dir.display()
        );
        Ok(())
    }

    fn write(&self) -> Result<PathBuf> {
        ensure!(
            self.width > 0 && self.height > 0,
            "frame size must be non-zero, got {}x{}",
            self.width,
            self.height
        );
        let stream = self.format.stream_kind().unwrap_or(StreamKind::Color);
        let mut writer = RecordingWriter::create(&self.dir)?.with_device("synthetic");

        for index in 0..self.frames {
            let planes = self.planes(index)?;
            let planes: Vec<(&[u8], usize)> = planes
                .iter()
                .map(|(bytes, pitch)| (bytes.as_slice(), *pitch))
                .collect();
            writer.push(
                stream,
                self.format,
                self.width,
                self.height,
                FRAME_INTERVAL * index as u32,
                &planes,
            )?;
        }
        Ok(writer.finish()?)
    }

    /**
        Plane bytes and pitches of one gradient frame.

        Formats without a packed layout get plausibly sized planes of zeros,
        so recordings of them exercise the rejection path.
    */
    fn planes(&self, index: usize) -> Result<Vec<(Vec<u8>, usize)>> {
        let (width, height, pad) = (self.width, self.height, self.pad);

        let Some(layout) = self.format.layout() else {
            return match self.format {
                PixelFormat::Yuy2 => {
                    let pitch = (width + pad) * 2;
                    Ok(vec![(vec![0; pitch * height], pitch)])
                }
                PixelFormat::Nv12 => {
                    let pitch = width + pad;
                    Ok(vec![
                        (vec![0; pitch * height], pitch),
                        (vec![0; pitch * height.div_ceil(2)], pitch),
                    ])
                }
                other => bail!("cannot synthesize frames of format {other}"),
            };
        };

        let bpp = layout.bytes_per_pixel();
        let pitch = (width + pad) * bpp;
        let mut bytes = vec![0u8; pitch * height];
        for (y, row) in bytes.chunks_exact_mut(pitch).enumerate() {
            for x in 0..width {
                for channel in 0..layout.channels {
                    let value = gradient(x, y, index, channel);
                    let offset = (x * layout.channels + channel) * layout.element.size();
                    let target = &mut row[offset..offset + layout.element.size()];
                    match layout.element {
                        ElementType::U8 => target[0] = (value % 256) as u8,
                        ElementType::U16 => target.copy_from_slice(&((value % 4000) as u16).to_ne_bytes()),
                        ElementType::F32 => target.copy_from_slice(&((value % 4000) as f32).to_ne_bytes()),
                    }
                }
            }
        }
        Ok(vec![(bytes, pitch)])
    }
}

fn gradient(x: usize, y: usize, frame: usize, channel: usize) -> usize {
    x + y + frame * 8 + channel * 64
}
