/*!
    Frame to packed image conversion.
*/

use sensor_types::{Error, FrameDescriptor, ImageBuffer, Result};

/**
    Convert an acquired frame into a packed image buffer.

    The output has `height` rows and `pitch / bytes_per_pixel` columns, so any
    row padding in the source shows up as extra columns. Bytes are copied
    verbatim: BGR and BGRA formats keep their native channel order.

    Only single-plane packed formats are handled. Chroma subsampled formats
    fail with [`Error::UnsupportedFormat`], and extra planes or a pitch that
    is not a whole number of pixels fail with [`Error::UnsupportedLayout`].
    Nothing is allocated unless the frame is accepted.
*/
pub fn convert(frame: &FrameDescriptor<'_>) -> Result<ImageBuffer> {
    let layout = frame
        .format
        .layout()
        .ok_or(Error::UnsupportedFormat(frame.format))?;

    if frame.planes[1].is_some() {
        return Err(Error::unsupported_layout(format!(
            "{} frame has {} planes, only single-plane layouts are supported",
            frame.format,
            frame.plane_count()
        )));
    }

    let bytes_per_pixel = layout.bytes_per_pixel();
    let pitch = frame.pitches[0];
    if pitch % bytes_per_pixel != 0 {
        return Err(Error::unsupported_layout(format!(
            "pitch {pitch} is not a multiple of the {bytes_per_pixel}-byte {} pixel",
            frame.format
        )));
    }

    let (plane, _) = frame
        .primary_plane()
        .ok_or_else(|| Error::invalid_data("frame has no primary plane"))?;

    if frame.width == 0 || frame.height == 0 {
        return Err(Error::invalid_data(format!(
            "frame has zero dimensions {}x{}",
            frame.width, frame.height
        )));
    }

    let too_large = || {
        Error::invalid_data(format!(
            "{}x{} frame with pitch {pitch} is too large",
            frame.width, frame.height
        ))
    };

    let row_bytes = frame.width.checked_mul(bytes_per_pixel).ok_or_else(too_large)?;
    if pitch < row_bytes {
        return Err(Error::invalid_data(format!(
            "pitch {pitch} is shorter than a {}-pixel row",
            frame.width
        )));
    }

    // The last row may stop right after its pixels
    let required = (frame.height - 1)
        .checked_mul(pitch)
        .and_then(|n| n.checked_add(row_bytes))
        .ok_or_else(too_large)?;
    if plane.len() < required {
        return Err(Error::invalid_data(format!(
            "plane holds {} bytes, {}x{} frame with pitch {pitch} needs {required}",
            plane.len(),
            frame.width,
            frame.height
        )));
    }

    let cols = pitch / bytes_per_pixel;
    let mut image = ImageBuffer::new(layout, frame.height, cols)?;

    // Padding beyond the end of the plane stays zeroed
    let copied = plane.len().min(image.as_bytes().len());
    image.as_bytes_mut()[..copied].copy_from_slice(&plane[..copied]);

    Ok(image)
}

/**
    Convert a frame and drop any padding columns.

    The result is always `height` rows by `width` columns.
*/
pub fn convert_cropped(frame: &FrameDescriptor<'_>) -> Result<ImageBuffer> {
    let image = convert(frame)?;
    image.crop_columns(frame.width)
}
