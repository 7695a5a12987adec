pub mod analytics;
pub mod annotation;
pub mod classification;
pub mod selection;
pub mod session;
pub mod shared;
pub mod sync;
pub mod transform;
