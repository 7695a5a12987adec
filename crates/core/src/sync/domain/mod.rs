pub mod message;
pub mod reconnect_timer;
pub mod sync_error;
pub mod transport;
