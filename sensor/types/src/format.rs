/*!
    Pixel format and element types.
*/

use std::fmt;
use std::str::FromStr;

use crate::ParseError;

/**
    Pixel formats as tagged by the sensor SDK.

    The set is closed: anything the SDK reports that is not listed here is
    carried as [`PixelFormat::Other`] with its raw numeric tag.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Packed YUV 4:2:2, chroma subsampled
    Yuy2,
    /// Semi-planar YUV 4:2:0, chroma subsampled
    Nv12,
    /// BGRA layout on a little-endian machine, 32bpp
    Rgb32,
    /// BGR layout on a little-endian machine, 24bpp
    Rgb24,
    /// 8-bit gray image, or 8-bit IR
    Y8,
    /// 16-bit unsigned depth, millimeter precision
    Depth,
    /// 16-bit unsigned depth, device specific precision
    DepthRaw,
    /// 32-bit float depth, millimeter precision
    DepthF32,
    /// 8-bit depth confidence map
    DepthConfidence,
    /// 16-bit gray image
    Y16,
    /// Relative IR image, 8-bit
    Y8IrRelative,
    /// A tag outside the known SDK set.
    Other(u32),
}

impl PixelFormat {
    /// Every named format, in SDK tag order.
    pub const ALL: [Self; 11] = [
        Self::Yuy2,
        Self::Nv12,
        Self::Rgb32,
        Self::Rgb24,
        Self::Y8,
        Self::Depth,
        Self::DepthRaw,
        Self::DepthF32,
        Self::DepthConfidence,
        Self::Y16,
        Self::Y8IrRelative,
    ];

    /**
        Map a raw SDK format tag onto a pixel format.
    */
    pub const fn from_sdk_code(code: u32) -> Self {
        match code {
            0x0001_0000 => Self::Yuy2,
            0x0001_0001 => Self::Nv12,
            0x0001_0002 => Self::Rgb32,
            0x0001_0003 => Self::Rgb24,
            0x0001_0004 => Self::Y8,
            0x0002_0000 => Self::Depth,
            0x0002_0001 => Self::DepthRaw,
            0x0002_0002 => Self::DepthF32,
            0x4000_0004 => Self::DepthConfidence,
            0x0004_0000 => Self::Y16,
            0x0008_0000 => Self::Y8IrRelative,
            other => Self::Other(other),
        }
    }

    /**
        Returns the raw SDK format tag.
    */
    pub const fn sdk_code(self) -> u32 {
        match self {
            Self::Yuy2 => 0x0001_0000,
            Self::Nv12 => 0x0001_0001,
            Self::Rgb32 => 0x0001_0002,
            Self::Rgb24 => 0x0001_0003,
            Self::Y8 => 0x0001_0004,
            Self::Depth => 0x0002_0000,
            Self::DepthRaw => 0x0002_0001,
            Self::DepthF32 => 0x0002_0002,
            Self::DepthConfidence => 0x4000_0004,
            Self::Y16 => 0x0004_0000,
            Self::Y8IrRelative => 0x0008_0000,
            Self::Other(code) => code,
        }
    }

    /**
        Returns the packed layout this format converts to, or `None` when the
        format cannot be represented as a single packed image.
    */
    pub const fn layout(self) -> Option<PixelLayout> {
        let (element, channels) = match self {
            Self::Rgb32 => (ElementType::U8, 4),
            Self::Rgb24 => (ElementType::U8, 3),
            Self::Y8 | Self::Y8IrRelative => (ElementType::U8, 1),
            Self::Depth | Self::DepthRaw | Self::Y16 => (ElementType::U16, 1),
            Self::DepthF32 => (ElementType::F32, 1),
            Self::Yuy2 | Self::Nv12 | Self::DepthConfidence | Self::Other(_) => return None,
        };
        Some(PixelLayout { element, channels })
    }

    /**
        Returns true for chroma subsampled formats.
    */
    pub const fn is_planar(self) -> bool {
        matches!(self, Self::Yuy2 | Self::Nv12)
    }

    /**
        Returns the stream a format is normally produced by.
    */
    pub const fn stream_kind(self) -> Option<StreamKind> {
        match self {
            Self::Yuy2 | Self::Nv12 | Self::Rgb32 | Self::Rgb24 | Self::Y8 => {
                Some(StreamKind::Color)
            }
            Self::Depth | Self::DepthRaw | Self::DepthF32 | Self::DepthConfidence => {
                Some(StreamKind::Depth)
            }
            Self::Y16 | Self::Y8IrRelative => Some(StreamKind::Ir),
            Self::Other(_) => None,
        }
    }

    /**
        Returns true for formats holding depth values.
    */
    pub const fn is_depth(self) -> bool {
        matches!(self, Self::Depth | Self::DepthRaw | Self::DepthF32)
    }

    const fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::Yuy2 => "yuy2",
            Self::Nv12 => "nv12",
            Self::Rgb32 => "rgb32",
            Self::Rgb24 => "rgb24",
            Self::Y8 => "y8",
            Self::Depth => "depth",
            Self::DepthRaw => "depth_raw",
            Self::DepthF32 => "depth_f32",
            Self::DepthConfidence => "depth_confidence",
            Self::Y16 => "y16",
            Self::Y8IrRelative => "y8_ir_relative",
            Self::Other(_) => return None,
        })
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:08x}", self.sdk_code()),
        }
    }
}

impl FromStr for PixelFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        if let Some(format) = Self::ALL.into_iter().find(|f| f.name() == Some(lowered.as_str())) {
            return Ok(format);
        }
        if let Some(hex) = lowered.strip_prefix("0x")
            && let Ok(code) = u32::from_str_radix(hex, 16)
        {
            return Ok(Self::from_sdk_code(code));
        }
        Err(ParseError {
            kind: "pixel format",
            value: s.to_string(),
        })
    }
}

/**
    Per-channel storage type of a packed image.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Unsigned 8-bit integer
    U8,
    /// Unsigned 16-bit integer
    U16,
    /// 32-bit floating point
    F32,
}

impl ElementType {
    /**
        Returns the number of bytes per element.
    */
    pub const fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::F32 => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::F32 => "f32",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "u8" => Ok(Self::U8),
            "u16" => Ok(Self::U16),
            "f32" => Ok(Self::F32),
            _ => Err(ParseError {
                kind: "element type",
                value: s.to_string(),
            }),
        }
    }
}

/**
    Element type and channel count of a packed pixel.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelLayout {
    pub element: ElementType,
    pub channels: usize,
}

impl PixelLayout {
    /**
        Returns the number of bytes per pixel, all channels included.
    */
    pub const fn bytes_per_pixel(self) -> usize {
        self.element.size() * self.channels
    }
}

/**
    Sensor stream a frame belongs to.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StreamKind {
    Color,
    Depth,
    Ir,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Color => "color",
            Self::Depth => "depth",
            Self::Ir => "ir",
        })
    }
}

impl FromStr for StreamKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "color" => Ok(Self::Color),
            "depth" => Ok(Self::Depth),
            "ir" => Ok(Self::Ir),
            _ => Err(ParseError {
                kind: "stream",
                value: s.to_string(),
            }),
        }
    }
}
