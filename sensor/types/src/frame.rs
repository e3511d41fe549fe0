/*!
    Borrowed frame descriptors.
*/

use crate::PixelFormat;

/// Maximum number of memory planes a frame can carry.
pub const MAX_PLANES: usize = 4;

/**
    A read-only view of one acquired frame.

    Planes borrow the memory of whoever acquired the frame, so a descriptor
    cannot outlive the acquire/release window of its source. Unused planes
    are `None`; plane 0 is present on every valid frame.
*/
#[derive(Clone, Copy, Debug)]
pub struct FrameDescriptor<'a> {
    /// Pixel format tag.
    pub format: PixelFormat,
    /// Frame width in pixels.
    pub width: usize,
    /// Frame height in pixels.
    pub height: usize,
    /// Plane memory, in SDK plane order.
    pub planes: [Option<&'a [u8]>; MAX_PLANES],
    /// Byte distance between rows, per plane.
    pub pitches: [usize; MAX_PLANES],
}

impl<'a> FrameDescriptor<'a> {
    /**
        Describe a single-plane frame.
    */
    pub fn packed(
        format: PixelFormat,
        width: usize,
        height: usize,
        plane: &'a [u8],
        pitch: usize,
    ) -> Self {
        Self {
            format,
            width,
            height,
            planes: [Some(plane), None, None, None],
            pitches: [pitch, 0, 0, 0],
        }
    }

    /**
        Set an additional plane.

        Indices past [`MAX_PLANES`] are ignored.
    */
    pub fn with_plane(mut self, index: usize, plane: &'a [u8], pitch: usize) -> Self {
        if index < MAX_PLANES {
            self.planes[index] = Some(plane);
            self.pitches[index] = pitch;
        }
        self
    }

    /**
        Returns the number of planes present.
    */
    pub fn plane_count(&self) -> usize {
        self.planes.iter().filter(|p| p.is_some()).count()
    }

    /**
        Returns the first plane and its pitch, if present.
    */
    pub fn primary_plane(&self) -> Option<(&'a [u8], usize)> {
        self.planes[0].map(|p| (p, self.pitches[0]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_has_one_plane() {
        let data = [0u8; 12];
        let frame = FrameDescriptor::packed(PixelFormat::Y8, 4, 3, &data, 4);
        assert_eq!(frame.plane_count(), 1);
        assert_eq!(frame.primary_plane().map(|(p, pitch)| (p.len(), pitch)), Some((12, 4)));
    }

    #[test]
    fn with_plane_adds_planes() {
        let luma = [0u8; 16];
        let chroma = [0u8; 8];
        let frame = FrameDescriptor::packed(PixelFormat::Nv12, 4, 4, &luma, 4)
            .with_plane(1, &chroma, 4)
            .with_plane(9, &chroma, 4);
        assert_eq!(frame.plane_count(), 2);
        assert_eq!(frame.pitches[1], 4);
    }
}
