use super::sync_error::SyncError;

/// Lifecycle and traffic notifications from a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Opened,
    Text(String),
    /// The connection ended or an attempt failed; carries the reason when known.
    Closed(Option<String>),
}

/// Domain interface for the duplex connection to the backend.
///
/// Every method must return promptly: connection attempts and socket I/O
/// happen out of band and surface later through [`poll`](Self::poll).
pub trait Transport: Send {
    /// Begins a new connection attempt, abandoning any previous one.
    fn open(&mut self);

    /// Queues a text frame for delivery. Best effort: no acknowledgement.
    fn send(&mut self, text: String) -> Result<(), SyncError>;

    /// Next pending event, if any.
    fn poll(&mut self) -> Option<TransportEvent>;
}
