use crate::sync::domain::sync_error::SyncError;
use crate::sync::domain::transport::{Transport, TransportEvent};

/// Transport that never connects, for sessions fed from recorded messages.
#[derive(Debug, Default)]
pub struct OfflineTransport;

impl Transport for OfflineTransport {
    fn open(&mut self) {
        log::debug!("Offline transport: open ignored");
    }

    fn send(&mut self, _text: String) -> Result<(), SyncError> {
        Err(SyncError::NotConnected)
    }

    fn poll(&mut self) -> Option<TransportEvent> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_delivers_events() {
        let mut transport = OfflineTransport;
        transport.open();
        assert!(transport.poll().is_none());
    }

    #[test]
    fn test_send_reports_not_connected() {
        let mut transport = OfflineTransport;
        assert_eq!(transport.send("{}".into()), Err(SyncError::NotConnected));
    }
}
