use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::shared::bounding_box::TrackId;

/// Role configuration exchanged with the backend.
///
/// The sets may overlap on the wire; the registry resolves overlaps
/// when seeded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentificationConfig {
    #[serde(default)]
    pub player_ids: BTreeSet<TrackId>,
    #[serde(default)]
    pub ball_ids: BTreeSet<TrackId>,
    #[serde(default)]
    pub left_team: BTreeSet<TrackId>,
    #[serde(default)]
    pub right_team: BTreeSet<TrackId>,
    #[serde(default)]
    pub referee: BTreeSet<TrackId>,
}
