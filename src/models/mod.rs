pub mod display;
pub mod image;
pub mod question;

pub use display::*;
pub use image::*;
pub use question::*;
