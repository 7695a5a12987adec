use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analytics::passing_lanes::PassingConfig;
use crate::selection::hit_tester::TieBreak;
use crate::shared::constants::{
    DEFAULT_BACKEND_URL, DEFAULT_CONTROL_RADIUS, DEFAULT_HIT_LEEWAY, HEATMAP_COLS, HEATMAP_ROWS,
    RECONNECT_INTERVAL,
};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to access settings at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend_url: String,
    pub reconnect_interval_secs: u64,
    pub hit_leeway: f64,
    pub tie_break: TieBreak,
    pub heatmap_rows: usize,
    pub heatmap_cols: usize,
    pub control_radius: f64,
    pub min_possession_frames: usize,
    pub passing: PassingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            reconnect_interval_secs: RECONNECT_INTERVAL.as_secs(),
            hit_leeway: DEFAULT_HIT_LEEWAY,
            tie_break: TieBreak::default(),
            heatmap_rows: HEATMAP_ROWS,
            heatmap_cols: HEATMAP_COLS,
            control_radius: DEFAULT_CONTROL_RADIUS,
            min_possession_frames: 1,
            passing: PassingConfig::default(),
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Pitchtag").join("settings.json"))
    }

    /// Settings from the user config directory, or defaults when the file
    /// is missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            log::warn!("Ignoring settings file: {e}");
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::config_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source: std::io::Error| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(io_err)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.reconnect_interval_secs.max(1))
    }
}
