/*!
    Depth visualisation helpers.
*/

use sensor_types::{ElementType, Error, ImageBuffer, PixelLayout, Result, Sample};

/// Depth mapped to full white, in millimeters.
pub const DEFAULT_MAX_DEPTH_MM: f64 = 4000.0;

/**
    Returns the scale factor mapping `0..=max_mm` onto `0..=255`.
*/
pub fn depth_alpha(max_mm: f64) -> f64 {
    255.0 / max_mm
}

/**
    Map every sample to `round(value * alpha + beta)`, saturated to `u8`.

    The channel count is kept. NaN samples become 0.
*/
pub fn scale_to_u8(image: &ImageBuffer, alpha: f64, beta: f64) -> Result<ImageBuffer> {
    let data = match image.element() {
        ElementType::U8 => scale_samples::<u8>(image, alpha, beta),
        ElementType::U16 => scale_samples::<u16>(image, alpha, beta),
        ElementType::F32 => scale_samples::<f32>(image, alpha, beta),
    };
    let layout = PixelLayout {
        element: ElementType::U8,
        channels: image.channels(),
    };
    ImageBuffer::from_bytes(layout, image.rows(), image.cols(), data)
}

fn scale_samples<T: Sample>(image: &ImageBuffer, alpha: f64, beta: f64) -> Vec<u8> {
    image
        .as_bytes()
        .chunks_exact(std::mem::size_of::<T>())
        .map(|chunk| saturate_u8(bytemuck::pod_read_unaligned::<T>(chunk).to_f64() * alpha + beta))
        .collect()
}

fn saturate_u8(value: f64) -> u8 {
    if value.is_nan() {
        0
    } else {
        value.round().clamp(0.0, 255.0) as u8
    }
}

/**
    Expand a single-channel 8-bit image to three identical BGR channels.
*/
pub fn gray_to_bgr(image: &ImageBuffer) -> Result<ImageBuffer> {
    if image.element() != ElementType::U8 || image.channels() != 1 {
        return Err(Error::unsupported_layout(format!(
            "gray to BGR needs a 1-channel u8 image, got {}-channel {}",
            image.channels(),
            image.element()
        )));
    }

    let data = image.as_bytes().iter().flat_map(|&v| [v, v, v]).collect();
    let layout = PixelLayout {
        element: ElementType::U8,
        channels: 3,
    };
    ImageBuffer::from_bytes(layout, image.rows(), image.cols(), data)
}

/**
    Render a depth image as an 8-bit BGR preview, with `max_mm` as white.
*/
pub fn visualize_depth(image: &ImageBuffer, max_mm: f64) -> Result<ImageBuffer> {
    if max_mm <= 0.0 || !max_mm.is_finite() {
        return Err(Error::invalid_data(format!("max depth must be positive, got {max_mm}")));
    }
    let gray = scale_to_u8(image, depth_alpha(max_mm), 0.0)?;
    gray_to_bgr(&gray)
}
