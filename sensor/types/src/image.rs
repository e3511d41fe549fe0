/*!
    Owned packed image buffers.
*/

use bytemuck::Pod;

use crate::{ElementType, Error, PixelLayout, Result};

/**
    A scalar type that can be read out of an [`ImageBuffer`].
*/
pub trait Sample: Pod {
    const ELEMENT: ElementType;

    /**
        Returns the sample as a float, for scaling.
    */
    fn to_f64(self) -> f64;
}

impl Sample for u8 {
    const ELEMENT: ElementType = ElementType::U8;

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Sample for u16 {
    const ELEMENT: ElementType = ElementType::U16;

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Sample for f32 {
    const ELEMENT: ElementType = ElementType::F32;

    fn to_f64(self) -> f64 {
        self as f64
    }
}

/**
    A packed, row-major image with interleaved channels.

    The buffer exclusively owns its bytes and holds exactly
    `rows * cols * channels * element.size()` of them, stored in native
    byte order. `cols` may be wider than the logical frame width when the
    source rows carried padding.
*/
#[derive(Clone, PartialEq)]
pub struct ImageBuffer {
    element: ElementType,
    channels: usize,
    rows: usize,
    cols: usize,
    data: Vec<u8>,
}

impl ImageBuffer {
    /**
        Allocate a zero-filled buffer.
    */
    pub fn new(layout: PixelLayout, rows: usize, cols: usize) -> Result<Self> {
        let len = byte_len(layout, rows, cols)?;
        Ok(Self {
            element: layout.element,
            channels: layout.channels,
            rows,
            cols,
            data: vec![0; len],
        })
    }

    /**
        Wrap existing bytes, checking the length against the dimensions.
    */
    pub fn from_bytes(layout: PixelLayout, rows: usize, cols: usize, data: Vec<u8>) -> Result<Self> {
        let expected = byte_len(layout, rows, cols)?;
        if data.len() != expected {
            return Err(Error::invalid_data(format!(
                "{rows}x{cols}x{} {} image needs {expected} bytes, got {}",
                layout.channels,
                layout.element,
                data.len()
            )));
        }
        Ok(Self {
            element: layout.element,
            channels: layout.channels,
            rows,
            cols,
            data,
        })
    }

    pub fn element(&self) -> ElementType {
        self.element
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn layout(&self) -> PixelLayout {
        PixelLayout {
            element: self.element,
            channels: self.channels,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /**
        Returns the number of bytes in one row.
    */
    pub fn row_bytes(&self) -> usize {
        self.cols * self.layout().bytes_per_pixel()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /**
        Returns the bytes of one row, or `None` if out of range.
    */
    pub fn row(&self, row: usize) -> Option<&[u8]> {
        if row >= self.rows {
            return None;
        }
        let stride = self.row_bytes();
        Some(&self.data[row * stride..(row + 1) * stride])
    }

    /**
        Read one sample.

        Returns `None` if the coordinates are out of range or `T` does not
        match the element type.
    */
    pub fn sample<T: Sample>(&self, row: usize, col: usize, channel: usize) -> Option<T> {
        if T::ELEMENT != self.element || col >= self.cols || channel >= self.channels {
            return None;
        }
        let row = self.row(row)?;
        let size = self.element.size();
        let offset = (col * self.channels + channel) * size;
        Some(bytemuck::pod_read_unaligned(&row[offset..offset + size]))
    }

    /**
        Read every channel of one pixel as floats.
    */
    pub fn pixel_f64(&self, row: usize, col: usize) -> Option<Vec<f64>> {
        (0..self.channels)
            .map(|channel| match self.element {
                ElementType::U8 => self.sample::<u8>(row, col, channel).map(Sample::to_f64),
                ElementType::U16 => self.sample::<u16>(row, col, channel).map(Sample::to_f64),
                ElementType::F32 => self.sample::<f32>(row, col, channel).map(Sample::to_f64),
            })
            .collect()
    }

    /**
        Copy all samples out as `T`, in row-major interleaved order.
    */
    pub fn samples<T: Sample>(&self) -> Option<Vec<T>> {
        if T::ELEMENT != self.element {
            return None;
        }
        Some(
            self.data
                .chunks_exact(self.element.size())
                .map(|chunk| bytemuck::pod_read_unaligned::<T>(chunk))
                .collect(),
        )
    }

    /**
        Returns a copy holding only the first `width` columns of every row.

        Used to drop padding columns carried over from the source stride.
    */
    pub fn crop_columns(&self, width: usize) -> Result<Self> {
        if width > self.cols {
            return Err(Error::invalid_data(format!(
                "cannot crop {} columns to {width}",
                self.cols
            )));
        }
        if width == self.cols {
            return Ok(self.clone());
        }

        let keep = width * self.layout().bytes_per_pixel();
        let mut data = Vec::with_capacity(self.rows * keep);
        for row in self.data.chunks_exact(self.row_bytes()) {
            data.extend_from_slice(&row[..keep]);
        }
        Self::from_bytes(self.layout(), self.rows, width, data)
    }
}

/**
    Returns the byte size of a `rows x cols` image.

    Fails for channel counts other than 1, 3 or 4 and for sizes that do not
    fit in memory.
*/
fn byte_len(layout: PixelLayout, rows: usize, cols: usize) -> Result<usize> {
    if !matches!(layout.channels, 1 | 3 | 4) {
        return Err(Error::unsupported_layout(format!(
            "{}-channel images are not supported",
            layout.channels
        )));
    }
    rows.checked_mul(cols)
        .and_then(|pixels| pixels.checked_mul(layout.bytes_per_pixel()))
        .ok_or_else(|| Error::invalid_data(format!("{rows}x{cols} image is too large")))
}

impl std::fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("element", &self.element)
            .field("channels", &self.channels)
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAY16: PixelLayout = PixelLayout {
        element: ElementType::U16,
        channels: 1,
    };

    const BGR: PixelLayout = PixelLayout {
        element: ElementType::U8,
        channels: 3,
    };

    #[test]
    fn new_is_zeroed_and_sized() {
        let image = ImageBuffer::new(BGR, 2, 5).unwrap();
        assert_eq!(image.as_bytes().len(), 2 * 5 * 3);
        assert!(image.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(image.row_bytes(), 15);
    }

    #[test]
    fn from_bytes_checks_length() {
        assert!(ImageBuffer::from_bytes(GRAY16, 2, 2, vec![0; 7]).is_err());
        assert!(ImageBuffer::from_bytes(GRAY16, 2, 2, vec![0; 8]).is_ok());
    }

    #[test]
    fn oversized_or_odd_layouts_are_errors() {
        assert!(matches!(
            ImageBuffer::new(GRAY16, usize::MAX, 3),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            ImageBuffer::from_bytes(GRAY16, usize::MAX / 2, 2, Vec::new()),
            Err(Error::InvalidData(_))
        ));

        let two_channel = PixelLayout {
            element: ElementType::U8,
            channels: 2,
        };
        assert!(matches!(
            ImageBuffer::from_bytes(two_channel, 1, 1, vec![0; 2]),
            Err(Error::UnsupportedLayout(_))
        ));
    }

    #[test]
    fn sample_reads_native_values() {
        let values: [u16; 4] = [1, 500, 4000, u16::MAX];
        let bytes = bytemuck::cast_slice::<u16, u8>(&values[..]).to_vec();
        let image = ImageBuffer::from_bytes(GRAY16, 2, 2, bytes).unwrap();

        assert_eq!(image.sample::<u16>(0, 1, 0), Some(500));
        assert_eq!(image.sample::<u16>(1, 1, 0), Some(u16::MAX));
        assert_eq!(image.sample::<u16>(2, 0, 0), None);
        assert_eq!(image.sample::<u8>(0, 0, 0), None);
        assert_eq!(image.samples::<u16>(), Some(values.to_vec()));
        assert_eq!(image.pixel_f64(1, 0), Some(vec![4000.0]));
        assert_eq!(image.pixel_f64(0, 2), None);
    }

    #[test]
    fn crop_drops_trailing_columns() {
        let bytes: Vec<u8> = (0..24).collect();
        let image = ImageBuffer::from_bytes(BGR, 2, 4, bytes).unwrap();
        let cropped = image.crop_columns(3).unwrap();

        assert_eq!(cropped.cols(), 3);
        assert_eq!(cropped.row(0), Some(&[0, 1, 2, 3, 4, 5, 6, 7, 8][..]));
        assert_eq!(cropped.row(1), Some(&[12, 13, 14, 15, 16, 17, 18, 19, 20][..]));
        assert!(image.crop_columns(5).is_err());
    }
}
