/*!
    Frame persistence and previews for the sensor frame crates.

    Converted frames are stored as named matrices in a JSON-lines file, one
    frame per line, and can be previewed as PNG images.
*/

mod preview;
mod store;

pub use self::preview::save_png;
pub use self::store::{FrameStore, StoredFrame};
