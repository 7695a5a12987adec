pub mod appearance;
pub mod heatmap;
pub mod passing_lanes;
pub mod possession;
