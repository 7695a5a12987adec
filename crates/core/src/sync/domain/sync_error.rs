use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyncError {
    #[error("connection lost: {0}")]
    ConnectionLost(String),
    #[error("malformed message: {0}")]
    MalformedMessage(String),
    #[error("not connected")]
    NotConnected,
}
