use serde::{Deserialize, Serialize};

use crate::shared::bounding_box::{BoundingBox, RenderedBox, TrackId};
use crate::shared::constants::DEFAULT_HIT_LEEWAY;
use crate::shared::resolution::Resolution;
use crate::transform::coordinate_transform::{to_rendered, TransformError};

/// How to choose between several boxes that all contain the click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// First match in frame order.
    FirstMatch,
    /// Smallest rendered area; equal areas fall back to frame order.
    #[default]
    SmallestArea,
}

/// Resolves operator clicks on the render surface to tracking identities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTester {
    leeway: f64,
    tie_break: TieBreak,
}

impl HitTester {
    pub fn new(leeway: f64, tie_break: TieBreak) -> Self {
        Self { leeway, tie_break }
    }

    pub fn leeway(&self) -> f64 {
        self.leeway
    }

    /// Transforms every box to rendered space and tests the click against
    /// its bounds grown by the leeway, in rendered pixels.
    pub fn resolve_click(
        &self,
        click: (f64, f64),
        boxes: &[BoundingBox],
        natural: Resolution,
        rendered: Resolution,
    ) -> Result<Option<TrackId>, TransformError> {
        let mut best: Option<RenderedBox> = None;
        for bbox in boxes {
            let r = to_rendered(bbox, natural, rendered)?;
            if !r.contains_with_leeway(click.0, click.1, self.leeway) {
                continue;
            }
            match (self.tie_break, best) {
                (TieBreak::FirstMatch, _) => return Ok(Some(r.id)),
                (TieBreak::SmallestArea, Some(current)) if current.area() <= r.area() => {}
                (TieBreak::SmallestArea, _) => best = Some(r),
            }
        }
        Ok(best.map(|r| r.id))
    }
}

impl Default for HitTester {
    fn default() -> Self {
        Self::new(DEFAULT_HIT_LEEWAY, TieBreak::default())
    }
}
