use crate::annotation::annotation_store::AnnotationStore;
use crate::classification::classification_registry::ClassificationRegistry;
use crate::classification::role::Role;
use crate::shared::bounding_box::{FrameIndex, TrackId};
use crate::shared::resolution::Resolution;
use crate::sync::domain::message::{FormRecord, PlayerIdentity};

/// Everything the render and input layers read, owned by one controller.
#[derive(Debug, Default)]
pub struct AnnotatorState {
    pub store: AnnotationStore,
    pub registry: ClassificationRegistry,
    pub active_frame: FrameIndex,
    /// Source video size; 0x0 until the video reports it.
    pub natural: Resolution,
    pub current_video: Option<String>,
    pub videos: Vec<String>,
    pub video_prefix: String,
    /// Roster rows of the loaded video, as last sent by the backend.
    pub roster: Vec<PlayerIdentity>,
    pub form_reply: Option<FormRecord>,
    pub connected: bool,
}

/// A single mutation of [`AnnotatorState`], delivered to observers after
/// it has been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    Connection { connected: bool },
    FrameUpdated {
        frame: FrameIndex,
        stored: usize,
        duplicates: usize,
    },
    ActiveFrame(FrameIndex),
    Selection(Option<TrackId>),
    Classification { id: TrackId, role: Option<Role> },
    IdentificationSeeded,
    Roster(usize),
    BoxCorrected { frame: FrameIndex, id: TrackId },
    VideoList(usize),
    VideoLoaded(String),
    FormReply,
}

impl StateChange {
    /// Short stable name, used as a counter key.
    pub fn kind(&self) -> &'static str {
        match self {
            StateChange::Connection { .. } => "connection",
            StateChange::FrameUpdated { .. } => "frame_updated",
            StateChange::ActiveFrame(_) => "active_frame",
            StateChange::Selection(_) => "selection",
            StateChange::Classification { .. } => "classification",
            StateChange::IdentificationSeeded => "identification_seeded",
            StateChange::Roster(_) => "roster",
            StateChange::BoxCorrected { .. } => "box_corrected",
            StateChange::VideoList(_) => "video_list",
            StateChange::VideoLoaded(_) => "video_loaded",
            StateChange::FormReply => "form_reply",
        }
    }
}
