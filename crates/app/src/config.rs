// Copyright 2025-2026 CEMAXECUTER LLC

use std::path::Path;

use serde::{Deserialize, Serialize};

use mw_dsp::heatmap::{NUM_ANGLE_BINS, RANGE_IDX_TO_METERS};
use mw_dsp::GridConfig;
use mw_protocol::AntennaGeometry;
use mw_source::DEFAULT_CHUNK_SIZE;

use crate::stream::DEFAULT_MAX_BUFFER_LEN;

/// Sensor layout and output raster. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub num_tx_azim_ant: usize,
    pub num_rx_ant: usize,
    pub num_range_bins: usize,
    /// Firmware channel-enable masks; when both are set they override the
    /// antenna counts.
    pub tx_channel_en: Option<u8>,
    pub rx_channel_en: Option<u8>,
    pub num_angle_bins: usize,
    pub range_idx_to_meters: f64,
    pub range_width: f64,
    pub range_depth: f64,
    pub grid_points_x: usize,
    pub grid_points_y: usize,
    pub chunk_size: usize,
    pub max_buffer_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_tx_azim_ant: 2,
            num_rx_ant: 4,
            num_range_bins: 256,
            tx_channel_en: None,
            rx_channel_en: None,
            num_angle_bins: NUM_ANGLE_BINS,
            range_idx_to_meters: RANGE_IDX_TO_METERS,
            range_width: 3.0,
            range_depth: 3.0,
            grid_points_x: 50,
            grid_points_y: 50,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_buffer_len: DEFAULT_MAX_BUFFER_LEN,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        Self::from_json(&text).map_err(|e| format!("invalid config {}: {}", path.display(), e))
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn geometry(&self) -> AntennaGeometry {
        match (self.tx_channel_en, self.rx_channel_en) {
            (Some(tx), Some(rx)) => AntennaGeometry::from_channel_masks(tx, rx, self.num_range_bins),
            _ => AntennaGeometry::new(self.num_tx_azim_ant, self.num_rx_ant, self.num_range_bins),
        }
    }

    pub fn grid(&self) -> GridConfig {
        GridConfig {
            num_angle_bins: self.num_angle_bins,
            range_idx_to_meters: self.range_idx_to_meters,
            range_width: self.range_width,
            range_depth: self.range_depth,
            grid_points_x: self.grid_points_x,
            grid_points_y: self.grid_points_y,
        }
    }
}
