use serde::{Deserialize, Serialize};

/// Upstream tracker handle, stable across frames for one physical object.
pub type TrackId = u32;

/// Index of a decoded video frame. Assigned monotonically by the source
/// feed but not necessarily contiguous.
pub type FrameIndex = usize;

/// One detected object in one frame, in natural (source video) pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    /// Legacy feeds name this field `owner`; buffered frames name it `user`.
    #[serde(alias = "owner", alias = "user")]
    pub id: TrackId,
}

impl BoundingBox {
    pub fn new(id: TrackId, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h, id }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// A box mapped onto the display surface, snapped to the pixel grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderedBox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub id: TrackId,
}

impl RenderedBox {
    /// Whether `(px, py)` lies inside the box grown by `leeway` on every side.
    pub fn contains_with_leeway(&self, px: f64, py: f64, leeway: f64) -> bool {
        // Edges in f64: saturated coordinates would overflow in i32.
        let left = self.x as f64 - leeway;
        let right = self.x as f64 + self.w as f64 + leeway;
        let top = self.y as f64 - leeway;
        let bottom = self.y as f64 + self.h as f64 + leeway;
        (left..=right).contains(&px) && (top..=bottom).contains(&py)
    }

    pub fn area(&self) -> i64 {
        self.w.max(0) as i64 * self.h.max(0) as i64
    }
}
