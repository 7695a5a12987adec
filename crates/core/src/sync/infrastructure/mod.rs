pub mod offline_transport;
pub mod websocket_transport;
