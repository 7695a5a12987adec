pub mod classification_registry;
pub mod highlight;
pub mod identification_config;
pub mod role;
