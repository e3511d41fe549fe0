/*!
    Pixel format transcoding for sensor frames.

    This crate turns an acquired frame, as tagged by the sensor SDK, into a
    packed [`ImageBuffer`](sensor_types::ImageBuffer) with the matching element
    type and channel count. It also carries the small depth visualisation
    helpers used to preview depth streams.
*/

mod convert;
mod depth;

pub use self::convert::{convert, convert_cropped};
pub use self::depth::{DEFAULT_MAX_DEPTH_MM, depth_alpha, gray_to_bgr, scale_to_u8, visualize_depth};
