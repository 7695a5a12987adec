//! Wire messages exchanged with the annotation backend.
//!
//! Inbound text is validated here and either becomes one of the known
//! [`InboundMessage`] variants or is rejected as malformed. Nothing is
//! projected field-by-field from an untyped record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::sync_error::SyncError;
use crate::classification::identification_config::IdentificationConfig;
use crate::shared::bounding_box::{BoundingBox, FrameIndex, TrackId};

/// Free-form operator form record, sent verbatim and echoed back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormRecord {
    pub text: String,
    pub num: f64,
}

/// One roster row sent after buffered frames: `[sr_no, identity, jersey]`.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerIdentity {
    pub sr_no: u32,
    pub identity: TrackId,
    pub jersey: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InboundMessage {
    /// Box set for the frame the last request targeted.
    Boxes(Vec<BoundingBox>),
    /// Several frames at once, ascending by frame index.
    BufferedFrames(BTreeMap<FrameIndex, Vec<BoundingBox>>),
    VideoList { videos: Vec<String>, prefix: String },
    Identification(IdentificationConfig),
    /// Roster of the loaded video.
    PlayerInfo(Vec<PlayerIdentity>),
    FormReply(FormRecord),
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum TaggedInbound {
    // Frame keys arrive as JSON object keys, i.e. strings.
    #[serde(rename = "bufferedFrames")]
    BufferedFrames {
        data: BTreeMap<String, Vec<BoundingBox>>,
    },
    #[serde(rename = "vidList")]
    VideoList {
        data: Vec<String>,
        #[serde(default)]
        prefix: String,
    },
    #[serde(rename = "identification")]
    Identification { data: IdentificationConfig },
    // Rows come from a dataframe dump: numbers may arrive as floats.
    #[serde(rename = "player_info")]
    PlayerInfo {
        data: Vec<(f64, f64, Option<JerseyWire>)>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JerseyWire {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireInbound {
    Boxes(Vec<BoundingBox>),
    Tagged(TaggedInbound),
    Form(FormRecord),
}

impl InboundMessage {
    pub fn parse(text: &str) -> Result<Self, SyncError> {
        let wire: WireInbound = serde_json::from_str(text).map_err(|_| {
            SyncError::MalformedMessage(format!("unrecognised payload: {}", truncate(text, 120)))
        })?;
        Ok(match wire {
            WireInbound::Boxes(boxes) => InboundMessage::Boxes(boxes),
            WireInbound::Tagged(TaggedInbound::BufferedFrames { data }) => {
                InboundMessage::BufferedFrames(parse_frame_keys(data)?)
            }
            WireInbound::Tagged(TaggedInbound::VideoList { data, prefix }) => {
                InboundMessage::VideoList {
                    videos: data,
                    prefix,
                }
            }
            WireInbound::Tagged(TaggedInbound::Identification { data }) => {
                InboundMessage::Identification(data)
            }
            WireInbound::Tagged(TaggedInbound::PlayerInfo { data }) => {
                InboundMessage::PlayerInfo(parse_roster(data)?)
            }
            WireInbound::Form(form) => InboundMessage::FormReply(form),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
enum BoxesLiteral {
    #[serde(rename = "boxes")]
    Boxes,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoxRequest {
    data: BoxesLiteral,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame: Option<FrameIndex>,
}

impl BoxRequest {
    pub fn new(frame: Option<FrameIndex>) -> Self {
        Self {
            data: BoxesLiteral::Boxes,
            frame,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Command {
    #[serde(rename = "getFiles")]
    ListVideos,
    #[serde(rename = "bufVid")]
    BufferVideo {
        video: String,
        min: FrameIndex,
        max: FrameIndex,
    },
    #[serde(rename = "update-players")]
    UpdatePlayers { data: IdentificationConfig },
    #[serde(rename = "correctBox")]
    CorrectBox {
        frame: FrameIndex,
        #[serde(rename = "box")]
        bbox: BoundingBox,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    RequestBoxes(BoxRequest),
    Form(FormRecord),
    Command(Command),
}

impl OutboundMessage {
    pub fn request_boxes(frame: Option<FrameIndex>) -> Self {
        OutboundMessage::RequestBoxes(BoxRequest::new(frame))
    }

    pub fn to_json(&self) -> Result<String, SyncError> {
        serde_json::to_string(self).map_err(|e| SyncError::MalformedMessage(e.to_string()))
    }
}

fn parse_frame_keys(
    data: BTreeMap<String, Vec<BoundingBox>>,
) -> Result<BTreeMap<FrameIndex, Vec<BoundingBox>>, SyncError> {
    data.into_iter()
        .map(|(key, boxes)| {
            key.trim()
                .parse::<FrameIndex>()
                .map(|frame| (frame, boxes))
                .map_err(|_| SyncError::MalformedMessage(format!("invalid frame index {key:?}")))
        })
        .collect()
}

fn parse_roster(
    rows: Vec<(f64, f64, Option<JerseyWire>)>,
) -> Result<Vec<PlayerIdentity>, SyncError> {
    rows.into_iter()
        .map(|(sr_no, identity, jersey)| {
            Ok(PlayerIdentity {
                sr_no: whole_number(sr_no, "sr_no")?,
                identity: whole_number(identity, "identity")?,
                jersey: jersey.map(|j| match j {
                    JerseyWire::Number(n) if n.fract() == 0.0 => format!("{}", n as i64),
                    JerseyWire::Number(n) => n.to_string(),
                    JerseyWire::Text(t) => t,
                }),
            })
        })
        .collect()
}

fn whole_number(value: f64, field: &str) -> Result<u32, SyncError> {
    if value.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&value) {
        Ok(value as u32)
    } else {
        Err(SyncError::MalformedMessage(format!(
            "roster {field} must be a non-negative integer, got {value}"
        )))
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
