pub mod image_list;
pub mod portfolio;

pub use image_list::*;
pub use portfolio::*;
