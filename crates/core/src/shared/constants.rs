use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "ws://localhost:8001/";

/// Fixed delay between reconnection attempts while the backend is unreachable.
pub const RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

/// Click tolerance around a box, in rendered pixels.
pub const DEFAULT_HIT_LEEWAY: f64 = 20.0;

/// Heatmap grid expected by the frontend: 10 rows by 15 columns.
pub const HEATMAP_ROWS: usize = 10;
pub const HEATMAP_COLS: usize = 15;

/// Ball-to-player center distance, in natural pixels, that counts as control.
pub const DEFAULT_CONTROL_RADIUS: f64 = 40.0;
