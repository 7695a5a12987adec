use std::collections::HashMap;
use std::time::Instant;

use super::annotator_state::{AnnotatorState, StateChange};

/// Observer notified after every state mutation.
///
/// Lets render layers, loggers and tests react to changes without the
/// controller knowing who is listening.
pub trait StateObserver: Send {
    fn on_change(&mut self, change: &StateChange, state: &AnnotatorState);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all notifications.
pub struct NullStateObserver;

impl StateObserver for NullStateObserver {
    fn on_change(&mut self, _change: &StateChange, _state: &AnnotatorState) {}
}

/// Logs notable changes through the `log` facade and counts every change
/// by kind for a summary at shutdown.
///
/// Frame updates are logged every `throttle_frames` updates.
pub struct LoggingStateObserver {
    throttle_frames: usize,
    counts: HashMap<&'static str, usize>,
    duplicates: usize,
    start_time: Instant,
}

impl LoggingStateObserver {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            counts: HashMap::new(),
            duplicates: 0,
            start_time: Instant::now(),
        }
    }

    pub fn count(&self, kind: &str) -> usize {
        self.counts.get(kind).copied().unwrap_or(0)
    }

    /// Returns the formatted summary, or `None` if nothing happened.
    pub fn summary_string(&self) -> Option<String> {
        if self.counts.is_empty() {
            return None;
        }
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!("Session summary ({elapsed:.1}s):")];

        let mut kinds: Vec<_> = self.counts.iter().collect();
        kinds.sort();
        for (kind, count) in kinds {
            lines.push(format!("  {kind:22}: {count}"));
        }
        if self.duplicates > 0 {
            lines.push(format!("  duplicate ids dropped : {}", self.duplicates));
        }
        Some(lines.join("\n"))
    }
}

impl Default for LoggingStateObserver {
    fn default() -> Self {
        Self::new(25)
    }
}

impl StateObserver for LoggingStateObserver {
    fn on_change(&mut self, change: &StateChange, state: &AnnotatorState) {
        let seen = {
            let entry = self.counts.entry(change.kind()).or_insert(0);
            *entry += 1;
            *entry
        };

        match change {
            StateChange::FrameUpdated {
                frame,
                stored,
                duplicates,
            } => {
                self.duplicates += duplicates;
                if seen % self.throttle_frames == 0 {
                    log::info!(
                        "Frame {frame}: {stored} boxes ({} frames stored)",
                        state.store.frame_count()
                    );
                }
            }
            StateChange::Connection { connected } => {
                log::info!("Backend {}", if *connected { "connected" } else { "disconnected" });
            }
            StateChange::Classification { id, role: Some(role) } => {
                log::info!("Identity {id} classified as {role}");
            }
            StateChange::Classification { id, role: None } => {
                log::info!("Identity {id} unclassified");
            }
            StateChange::VideoLoaded(name) => log::info!("Loaded video {name}"),
            other => log::debug!("{other:?}"),
        }
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
