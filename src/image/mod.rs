//! Binary raster access for the staff-free sheet image.
//!
//! The pipeline only needs to know whether a pixel is ink or paper: runs are
//! extracted row by row and the convexity check reads single pixels around
//! stick ends. Any 8-bit buffer works; values below [`FOREGROUND_THRESHOLD`]
//! are foreground.

pub mod io;
pub mod traits;
pub mod u8;

pub use self::io::OwnedImage;
pub use self::traits::{ImageView, Rows};
pub use self::u8::ImageU8;

/// Gray level below which a pixel is considered ink.
pub const FOREGROUND_THRESHOLD: u8 = 128;
