//! Single owner of the annotator state.
//!
//! Every mutation (sync message, click, classification, frame change) goes
//! through [`SessionController`], which applies it to [`AnnotatorState`]
//! and then notifies the registered observers in registration order.

use std::time::Instant;

use super::annotator_state::{AnnotatorState, StateChange};
use super::state_observer::StateObserver;
use crate::classification::highlight::Highlight;
use crate::classification::role::Role;
use crate::shared::bounding_box::{BoundingBox, FrameIndex, RenderedBox, TrackId};
use crate::shared::resolution::Resolution;
use crate::shared::settings::Settings;
use crate::selection::hit_tester::HitTester;
use crate::sync::domain::message::{Command, FormRecord, InboundMessage, OutboundMessage};
use crate::sync::domain::transport::Transport;
use crate::sync::sync_channel::{SyncChannel, SyncEvent};
use crate::transform::coordinate_transform::to_rendered;

pub struct SessionController<T: Transport> {
    state: AnnotatorState,
    channel: SyncChannel<T>,
    hit_tester: HitTester,
    observers: Vec<Box<dyn StateObserver>>,
}

impl<T: Transport> SessionController<T> {
    pub fn new(transport: T, settings: &Settings) -> Self {
        Self {
            state: AnnotatorState::default(),
            channel: SyncChannel::new(transport, settings.reconnect_interval()),
            hit_tester: HitTester::new(settings.hit_leeway, settings.tie_break),
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn StateObserver>) {
        self.observers.push(observer);
    }

    pub fn start(&mut self, now: Instant) {
        self.channel.start(now);
    }

    /// Drains the sync channel and applies everything it delivered.
    /// Returns the number of events handled.
    pub fn tick(&mut self, now: Instant) -> usize {
        let events = self.channel.poll(now, Some(self.state.active_frame));
        let handled = events.len();
        for event in events {
            match event {
                SyncEvent::Connected => self.set_connected(true),
                SyncEvent::ConnectionLost(_) => self.set_connected(false),
                SyncEvent::Message(message) => self.apply_message(message),
            }
        }
        handled
    }

    /// Applies one inbound message. Bare box arrays belong to the active
    /// frame; buffered frames are applied in ascending frame order.
    pub fn apply_message(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::Boxes(boxes) => {
                let frame = self.state.active_frame;
                self.upsert(frame, boxes);
            }
            InboundMessage::BufferedFrames(frames) => {
                log::debug!("Received {} buffered frame(s)", frames.len());
                for (frame, boxes) in frames {
                    self.upsert(frame, boxes);
                }
            }
            InboundMessage::VideoList { videos, prefix } => {
                let count = videos.len();
                self.state.videos = videos;
                self.state.video_prefix = prefix;
                self.notify(StateChange::VideoList(count));
            }
            InboundMessage::Identification(config) => {
                self.state.registry.seed(&config);
                self.notify(StateChange::IdentificationSeeded);
            }
            InboundMessage::PlayerInfo(rows) => {
                let count = rows.len();
                self.state.roster = rows;
                self.notify(StateChange::Roster(count));
            }
            InboundMessage::FormReply(record) => {
                self.state.form_reply = Some(record);
                self.notify(StateChange::FormReply);
            }
        }
    }

    /// Moves playback to `frame`, requesting its boxes if none are stored.
    pub fn set_active_frame(&mut self, frame: FrameIndex) {
        if frame == self.state.active_frame {
            return;
        }
        self.state.active_frame = frame;
        self.notify(StateChange::ActiveFrame(frame));
        if !self.state.store.contains_frame(frame) {
            self.channel.send(&OutboundMessage::request_boxes(Some(frame)));
        }
    }

    pub fn set_natural_resolution(&mut self, natural: Resolution) {
        self.state.natural = natural;
    }

    /// Resolves a click on the render surface and makes the hit the active
    /// identity. A miss clears the selection. With an unusable resolution
    /// the click is ignored and the selection is left as it was.
    pub fn click(&mut self, point: (f64, f64), rendered: Resolution) -> Option<TrackId> {
        let boxes = self.state.store.get_frame(self.state.active_frame);
        match self
            .hit_tester
            .resolve_click(point, boxes, self.state.natural, rendered)
        {
            Ok(hit) => {
                self.state.registry.set_active(hit);
                self.notify(StateChange::Selection(hit));
                hit
            }
            Err(e) => {
                log::debug!("Ignoring click at {point:?}: {e}");
                None
            }
        }
    }

    /// Classifies the active identity, if any.
    pub fn classify_active(&mut self, role: Role) -> Option<TrackId> {
        let id = self.state.registry.active()?;
        self.classify(id, role);
        Some(id)
    }

    pub fn classify(&mut self, id: TrackId, role: Role) {
        self.state.registry.classify(id, role);
        self.notify(StateChange::Classification { id, role: Some(role) });
        self.push_identification();
    }

    pub fn unclassify(&mut self, id: TrackId) {
        if self.state.registry.unclassify(id).is_some() {
            self.notify(StateChange::Classification { id, role: None });
            self.push_identification();
        }
    }

    /// Replaces the stored box for `bbox.id` in `frame` and forwards the
    /// correction to the backend.
    pub fn correct_box(&mut self, frame: FrameIndex, bbox: BoundingBox) {
        self.state.store.correct_box(frame, bbox);
        self.notify(StateChange::BoxCorrected { frame, id: bbox.id });
        self.channel
            .send(&OutboundMessage::Command(Command::CorrectBox { frame, bbox }));
    }

    /// Switches to another source video: stored frames, roster and the
    /// selection are dropped, classifications are kept.
    pub fn load_video(&mut self, video: &str, min: FrameIndex, max: FrameIndex) {
        self.state.store.reset();
        self.state.roster.clear();
        self.state.registry.set_active(None);
        self.state.current_video = Some(video.to_string());
        self.state.active_frame = min;
        log::info!("Loading {video} frames {min}..={max}");
        self.notify(StateChange::VideoLoaded(video.to_string()));
        self.channel.send(&OutboundMessage::Command(Command::BufferVideo {
            video: video.to_string(),
            min,
            max,
        }));
    }

    pub fn request_video_list(&mut self) -> bool {
        self.channel.send(&OutboundMessage::Command(Command::ListVideos))
    }

    pub fn submit_form(&mut self, text: &str, num: f64) -> bool {
        self.channel.send(&OutboundMessage::Form(FormRecord {
            text: text.to_string(),
            num,
        }))
    }

    /// Boxes of the active frame in rendered space, with their highlight.
    ///
    /// `rendered` must be the surface size at paint time. If either
    /// resolution is unusable nothing is drawn.
    pub fn render_boxes(&self, rendered: Resolution) -> Vec<(RenderedBox, Highlight)> {
        let registry = &self.state.registry;
        let result: Result<Vec<_>, _> = self
            .state
            .store
            .get_frame(self.state.active_frame)
            .iter()
            .map(|bbox| {
                to_rendered(bbox, self.state.natural, rendered)
                    .map(|r| (r, registry.highlight_for(bbox.id)))
            })
            .collect();
        result.unwrap_or_else(|e| {
            log::debug!("Skipping paint of frame {}: {e}", self.state.active_frame);
            Vec::new()
        })
    }

    /// Asks every observer for its end-of-session summary.
    pub fn finish(&self) {
        for observer in &self.observers {
            observer.summary();
        }
    }

    pub fn state(&self) -> &AnnotatorState {
        &self.state
    }

    pub fn channel(&self) -> &SyncChannel<T> {
        &self.channel
    }

    #[cfg(test)]
    fn channel_mut(&mut self) -> &mut SyncChannel<T> {
        &mut self.channel
    }

    fn upsert(&mut self, frame: FrameIndex, boxes: Vec<BoundingBox>) {
        let report = self.state.store.upsert_frame(frame, boxes);
        self.notify(StateChange::FrameUpdated {
            frame,
            stored: report.stored,
            duplicates: report.duplicates.len(),
        });
    }

    fn set_connected(&mut self, connected: bool) {
        self.state.connected = connected;
        self.notify(StateChange::Connection { connected });
    }

    fn push_identification(&mut self) {
        let data = self.state.registry.to_config();
        self.channel
            .send(&OutboundMessage::Command(Command::UpdatePlayers { data }));
    }

    fn notify(&mut self, change: StateChange) {
        for observer in &mut self.observers {
            observer.on_change(&change, &self.state);
        }
    }
}
