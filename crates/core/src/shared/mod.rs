pub mod bounding_box;
pub mod constants;
pub mod resolution;
pub mod settings;
