//! Mapping between natural (source video) and rendered (display surface)
//! pixel coordinates.
//!
//! Axes scale independently: the display surface may stretch the video,
//! so no aspect-ratio correction is applied. Rendered output is floored
//! onto the pixel grid.

use thiserror::Error;

use crate::shared::bounding_box::{BoundingBox, RenderedBox};
use crate::shared::resolution::Resolution;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    #[error("degenerate resolution: natural {natural}, rendered {rendered}")]
    DegenerateResolution {
        natural: Resolution,
        rendered: Resolution,
    },
}

/// Per-axis factors from natural to rendered space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleFactors {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactors {
    /// Both resolutions must be re-read from the surface for every paint;
    /// never keep a `ScaleFactors` across frames.
    pub fn between(natural: Resolution, rendered: Resolution) -> Result<Self, TransformError> {
        if !natural.is_usable() || !rendered.is_usable() {
            return Err(TransformError::DegenerateResolution { natural, rendered });
        }
        Ok(Self {
            x: rendered.width / natural.width,
            y: rendered.height / natural.height,
        })
    }
}

pub fn to_rendered(
    bbox: &BoundingBox,
    natural: Resolution,
    rendered: Resolution,
) -> Result<RenderedBox, TransformError> {
    let scale = ScaleFactors::between(natural, rendered)?;
    Ok(RenderedBox {
        x: (bbox.x * scale.x).floor() as i32,
        y: (bbox.y * scale.y).floor() as i32,
        w: (bbox.w * scale.x).floor() as i32,
        h: (bbox.h * scale.y).floor() as i32,
        id: bbox.id,
    })
}

/// Maps a rendered-space point back into natural coordinates.
pub fn to_natural(
    point: (f64, f64),
    natural: Resolution,
    rendered: Resolution,
) -> Result<(f64, f64), TransformError> {
    let scale = ScaleFactors::between(natural, rendered)?;
    Ok((point.0 / scale.x, point.1 / scale.y))
}
