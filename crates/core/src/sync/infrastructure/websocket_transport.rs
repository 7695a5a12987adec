//! WebSocket transport backed by a blocking `tungstenite` client running on
//! a worker thread.
//!
//! Layout: `controller ⇄ crossbeam channels ⇄ worker [connect, read, write]`.
//! The worker polls the socket with a short read timeout so queued
//! outbound frames are flushed between reads.

use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::sync::domain::sync_error::SyncError;
use crate::sync::domain::transport::{Transport, TransportEvent};

const READ_POLL_INTERVAL: Duration = Duration::from_millis(25);

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

struct Session {
    events: Receiver<TransportEvent>,
    outbound: Sender<String>,
    cancelled: Arc<AtomicBool>,
}

pub struct WebSocketTransport {
    url: String,
    session: Option<Session>,
}

impl WebSocketTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            session: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn abandon_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancelled.store(true, Ordering::Relaxed);
        }
    }
}

impl Transport for WebSocketTransport {
    fn open(&mut self) {
        self.abandon_session();

        let (event_tx, event_rx) = crossbeam_channel::unbounded::<TransportEvent>();
        let (outbound_tx, outbound_rx) = crossbeam_channel::unbounded::<String>();
        let cancelled = Arc::new(AtomicBool::new(false));
        let cancelled_clone = cancelled.clone();
        let url = self.url.clone();

        thread::spawn(move || run_session(&url, &event_tx, &outbound_rx, &cancelled_clone));

        self.session = Some(Session {
            events: event_rx,
            outbound: outbound_tx,
            cancelled,
        });
    }

    fn send(&mut self, text: String) -> Result<(), SyncError> {
        let session = self.session.as_ref().ok_or(SyncError::NotConnected)?;
        session
            .outbound
            .send(text)
            .map_err(|_| SyncError::NotConnected)
    }

    fn poll(&mut self) -> Option<TransportEvent> {
        self.session.as_ref()?.events.try_recv().ok()
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.abandon_session();
    }
}

fn run_session(
    url: &str,
    events: &Sender<TransportEvent>,
    outbound: &Receiver<String>,
    cancelled: &AtomicBool,
) {
    let mut socket = match tungstenite::connect(url) {
        Ok((socket, _response)) => socket,
        Err(e) => {
            let _ = events.send(TransportEvent::Closed(Some(e.to_string())));
            return;
        }
    };

    if let Err(e) = set_read_timeout(&mut socket, READ_POLL_INTERVAL) {
        let _ = events.send(TransportEvent::Closed(Some(e.to_string())));
        return;
    }

    if events.send(TransportEvent::Opened).is_err() {
        return;
    }

    let reason = pump(&mut socket, events, outbound, cancelled);
    if !cancelled.load(Ordering::Relaxed) {
        let _ = events.send(TransportEvent::Closed(reason));
    }
}

/// Shuttles frames until the socket closes or the session is abandoned.
/// Returns the close reason, if any.
fn pump(
    socket: &mut Socket,
    events: &Sender<TransportEvent>,
    outbound: &Receiver<String>,
    cancelled: &AtomicBool,
) -> Option<String> {
    loop {
        if cancelled.load(Ordering::Relaxed) {
            let _ = socket.close(None);
            let _ = socket.flush();
            return None;
        }

        for text in outbound.try_iter() {
            log::debug!("-> {text}");
            if let Err(e) = socket.send(Message::Text(text)) {
                return Some(e.to_string());
            }
        }

        match socket.read() {
            Ok(Message::Text(text)) => {
                log::debug!("<- {} bytes", text.len());
                if events.send(TransportEvent::Text(text)).is_err() {
                    let _ = socket.close(None);
                    return None;
                }
            }
            Ok(Message::Close(frame)) => {
                return Some(
                    frame
                        .map(|f| f.reason.to_string())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "closed by peer".to_string()),
                );
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) => {}
            Err(e) => return Some(e.to_string()),
        }
    }
}

fn set_read_timeout(socket: &mut Socket, timeout: Duration) -> std::io::Result<()> {
    if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
        stream.set_read_timeout(Some(timeout))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::time::Instant;

    fn wait_for_event(transport: &mut WebSocketTransport) -> TransportEvent {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(event) = transport.poll() {
                return event;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("timed out waiting for transport event");
    }

    #[test]
    fn test_send_before_open_fails() {
        let mut transport = WebSocketTransport::new("ws://127.0.0.1:1/");
        assert_eq!(transport.send("x".into()), Err(SyncError::NotConnected));
        assert!(transport.poll().is_none());
    }

    #[test]
    fn test_refused_connection_reports_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut transport = WebSocketTransport::new(format!("ws://127.0.0.1:{port}/"));
        transport.open();
        assert!(matches!(
            wait_for_event(&mut transport),
            TransportEvent::Closed(Some(_))
        ));
    }

    #[test]
    fn test_exchanges_text_frames_with_server() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut ws = tungstenite::accept(stream).unwrap();
            let request = ws.read().unwrap();
            ws.send(Message::Text(r#"[{"x":1,"y":2,"w":3,"h":4,"id":5}]"#.into()))
                .unwrap();
            ws.close(None).unwrap();
            while ws.read().is_ok() {}
            request
        });

        let mut transport = WebSocketTransport::new(format!("ws://127.0.0.1:{port}/"));
        transport.open();
        assert_eq!(wait_for_event(&mut transport), TransportEvent::Opened);

        transport.send(r#"{"data":"boxes"}"#.into()).unwrap();
        assert_eq!(
            wait_for_event(&mut transport),
            TransportEvent::Text(r#"[{"x":1,"y":2,"w":3,"h":4,"id":5}]"#.into())
        );
        assert!(matches!(
            wait_for_event(&mut transport),
            TransportEvent::Closed(_)
        ));

        let request = server.join().unwrap();
        assert_eq!(request, Message::Text(r#"{"data":"boxes"}"#.into()));
    }
}
