use ndarray::Array2;

use crate::annotation::annotation_store::AnnotationStore;
use crate::classification::classification_registry::ClassificationRegistry;
use crate::classification::role::Role;
use crate::shared::resolution::Resolution;
use crate::transform::coordinate_transform::TransformError;

/// Occupancy counts over a `rows x cols` grid laid across the natural frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Heatmap {
    counts: Array2<u32>,
}

impl Heatmap {
    /// A zero-sized dimension is widened to one cell.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            counts: Array2::zeros((rows.max(1), cols.max(1))),
        }
    }

    pub fn rows(&self) -> usize {
        self.counts.nrows()
    }

    pub fn cols(&self) -> usize {
        self.counts.ncols()
    }

    /// Grid cell `(row, col)` holding a natural-space point. Points outside
    /// the frame are clamped to the border cells.
    pub fn cell_for(&self, point: (f64, f64), natural: Resolution) -> (usize, usize) {
        let col = scale_to_cell(point.0 / natural.width, self.cols());
        let row = scale_to_cell(point.1 / natural.height, self.rows());
        (row, col)
    }

    pub fn add(&mut self, point: (f64, f64), natural: Resolution) {
        let cell = self.cell_for(point, natural);
        self.counts[cell] += 1;
    }

    pub fn counts(&self) -> &Array2<u32> {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// Counts divided by the busiest cell; all zeros when empty.
    pub fn normalized(&self) -> Array2<f64> {
        let max = self.counts.iter().copied().max().unwrap_or(0);
        if max == 0 {
            return Array2::zeros(self.counts.raw_dim());
        }
        self.counts.mapv(|c| c as f64 / max as f64)
    }
}

fn scale_to_cell(fraction: f64, cells: usize) -> usize {
    let idx = (fraction * cells as f64).floor();
    if idx.is_nan() || idx < 0.0 {
        0
    } else {
        (idx as usize).min(cells - 1)
    }
}

/// One heatmap per role bucket.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapSet {
    pub left: Heatmap,
    pub right: Heatmap,
    pub ball: Heatmap,
}

/// Accumulates every stored box's center into the heatmap for its role.
/// Referees and unclassified identities are skipped.
pub fn build_heatmaps(
    store: &AnnotationStore,
    registry: &ClassificationRegistry,
    natural: Resolution,
    rows: usize,
    cols: usize,
) -> Result<HeatmapSet, TransformError> {
    if !natural.is_usable() {
        return Err(TransformError::DegenerateResolution {
            natural,
            rendered: natural,
        });
    }

    let mut set = HeatmapSet {
        left: Heatmap::new(rows, cols),
        right: Heatmap::new(rows, cols),
        ball: Heatmap::new(rows, cols),
    };

    for (_, boxes) in store.frames() {
        for bbox in boxes {
            let target = match registry.role_of(bbox.id) {
                Some(Role::LeftTeam) => &mut set.left,
                Some(Role::RightTeam) => &mut set.right,
                Some(Role::Ball) => &mut set.ball,
                Some(Role::Referee) | None => continue,
            };
            target.add(bbox.center(), natural);
        }
    }
    Ok(set)
}
