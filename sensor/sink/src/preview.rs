/*!
    PNG previews of converted frames.
*/

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageBuffer as PngBuffer, Luma, RgbImage, RgbaImage};

use sensor_types::{ElementType, Error, ImageBuffer, Result};

/**
    Write an image as PNG.

    8-bit images with 1, 3 or 4 channels are written as gray, RGB or RGBA.
    Three and four channel buffers hold BGR and BGRA, so blue and red are
    swapped on the way out. Single-channel 16-bit images are written as
    16-bit gray. Float images need scaling first and are rejected.
*/
pub fn save_png<P: AsRef<Path>>(path: P, image: &ImageBuffer) -> Result<()> {
    let path = path.as_ref();
    let dynamic = to_dynamic(image)?;
    dynamic
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| Error::encode(format!("{}: {e}", path.display())))
}

fn to_dynamic(image: &ImageBuffer) -> Result<DynamicImage> {
    let width = u32::try_from(image.cols())
        .map_err(|_| Error::invalid_data(format!("{} columns do not fit a PNG", image.cols())))?;
    let height = u32::try_from(image.rows())
        .map_err(|_| Error::invalid_data(format!("{} rows do not fit a PNG", image.rows())))?;
    let size_error = || Error::invalid_data("image bytes do not match its dimensions");

    match (image.element(), image.channels()) {
        (ElementType::U8, 1) => GrayImage::from_raw(width, height, image.as_bytes().to_vec())
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(size_error),
        (ElementType::U8, 3) => {
            let rgb = swap_red_blue(image.as_bytes(), 3);
            RgbImage::from_raw(width, height, rgb)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(size_error)
        }
        (ElementType::U8, 4) => {
            let rgba = swap_red_blue(image.as_bytes(), 4);
            RgbaImage::from_raw(width, height, rgba)
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(size_error)
        }
        (ElementType::U16, 1) => {
            let samples = image.samples::<u16>().ok_or_else(size_error)?;
            PngBuffer::<Luma<u16>, Vec<u16>>::from_raw(width, height, samples)
                .map(DynamicImage::ImageLuma16)
                .ok_or_else(size_error)
        }
        (element, channels) => Err(Error::unsupported_layout(format!(
            "no PNG preview for {channels}-channel {element} images"
        ))),
    }
}

fn swap_red_blue(bytes: &[u8], channels: usize) -> Vec<u8> {
    let mut out = bytes.to_vec();
    for pixel in out.chunks_exact_mut(channels) {
        pixel.swap(0, 2);
    }
    out
}
