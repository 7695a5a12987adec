//! Reconnecting duplex channel to the annotation backend.
//!
//! Single-threaded: the owner calls [`SyncChannel::poll`] from its event
//! loop and receives parsed [`SyncEvent`]s. A reconnection timer runs while
//! the channel is down and is cancelled on the first successful open.

use std::time::{Duration, Instant};

use super::domain::message::{InboundMessage, OutboundMessage};
use super::domain::reconnect_timer::ReconnectTimer;
use super::domain::sync_error::SyncError;
use super::domain::transport::{Transport, TransportEvent};
use crate::shared::bounding_box::FrameIndex;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Connected,
    /// An open connection dropped; stored annotations are untouched.
    ConnectionLost(SyncError),
    Message(InboundMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Connecting,
    Open,
}

pub struct SyncChannel<T: Transport> {
    transport: T,
    state: ChannelState,
    timer: ReconnectTimer,
    attempts: usize,
}

impl<T: Transport> SyncChannel<T> {
    pub fn new(transport: T, reconnect_interval: Duration) -> Self {
        Self {
            transport,
            state: ChannelState::Idle,
            timer: ReconnectTimer::new(reconnect_interval),
            attempts: 0,
        }
    }

    /// Opens the first connection and arms the reconnection timer, which
    /// keeps retrying until an open succeeds.
    pub fn start(&mut self, now: Instant) {
        if self.state != ChannelState::Idle {
            return;
        }
        self.attempt_open();
        self.timer.arm(now);
    }

    /// Drains transport events and fires a reconnection attempt when due.
    ///
    /// `active_frame` is the frame whose boxes are requested after an open.
    pub fn poll(&mut self, now: Instant, active_frame: Option<FrameIndex>) -> Vec<SyncEvent> {
        let mut events = Vec::new();

        while let Some(event) = self.transport.poll() {
            match event {
                TransportEvent::Opened => {
                    self.state = ChannelState::Open;
                    if self.timer.cancel() {
                        log::debug!("Reconnection timer cancelled");
                    }
                    log::info!("Connected to backend after {} attempt(s)", self.attempts);
                    self.attempts = 0;
                    self.send(&OutboundMessage::request_boxes(active_frame));
                    events.push(SyncEvent::Connected);
                }
                TransportEvent::Text(text) => match InboundMessage::parse(&text) {
                    Ok(message) => events.push(SyncEvent::Message(message)),
                    Err(e) => log::warn!("Dropping inbound message: {e}"),
                },
                TransportEvent::Closed(reason) => {
                    let reason = reason.unwrap_or_else(|| "closed by peer".to_string());
                    if self.state == ChannelState::Open {
                        let err = SyncError::ConnectionLost(reason);
                        log::warn!("{err}; reconnecting every {:?}", self.timer.interval());
                        events.push(SyncEvent::ConnectionLost(err));
                    } else {
                        log::debug!("Connection attempt failed: {reason}");
                    }
                    self.state = ChannelState::Connecting;
                    self.timer.arm(now);
                }
            }
        }

        if self.state == ChannelState::Connecting && self.timer.poll(now) {
            log::info!("Reconnecting to backend");
            self.attempt_open();
        }

        events
    }

    /// Best-effort delivery; failures are logged and otherwise ignored.
    pub fn send(&mut self, message: &OutboundMessage) -> bool {
        if self.state != ChannelState::Open {
            log::debug!("Not connected; dropping outbound {message:?}");
            return false;
        }
        let result = message
            .to_json()
            .and_then(|json| self.transport.send(json));
        match result {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to send message: {e}");
                false
            }
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ChannelState::Open
    }

    pub fn reconnect_timer(&self) -> &ReconnectTimer {
        &self.timer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[cfg(test)]
    pub(crate) fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn attempt_open(&mut self) {
        self.attempts += 1;
        self.state = ChannelState::Connecting;
        self.transport.open();
    }
}
