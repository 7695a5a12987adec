pub mod domain;
pub mod infrastructure;
pub mod sync_channel;
