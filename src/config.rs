//! Configuration for config area analysis.
//!
//! Provides centralized configuration for the detector, the locator and the
//! file reader with defaults matching the layouts seen in shipped kernels.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Master configuration for the analysis pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Byte order detection configuration.
    pub detection: DetectionConfig,
    /// Area location configuration.
    pub locator: LocatorConfig,
    /// I/O configuration for mapped input files.
    pub io: IOConfig,
}

impl AnalysisConfig {
    /// Parse a (possibly partial) JSON configuration; missing fields keep
    /// their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Byte order detection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Maximum number of bytes scanned for the entry array (default: 16384).
    ///
    /// Empirical bound; the entry array of every known kernel sits well
    /// inside the first page of the area.
    pub scan_horizon: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            scan_horizon: 16 * 1024,
        }
    }
}

/// Area location configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Alignment of the area start in the image (default: 4096).
    pub area_alignment: usize,
    /// Size of the area dump (default: 65536).
    pub area_size: usize,
    /// Additional earlier pages tried when the page holding the device tree
    /// is not the area start (default: 3).
    pub max_pages_back: usize,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            area_alignment: 4096,
            area_size: 64 * 1024,
            max_pages_back: 3,
        }
    }
}

/// I/O configuration for mapped input files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IOConfig {
    /// Maximum file size to map (default: 67108864 = 64MB).
    pub max_file_size: u64,
}

impl Default for IOConfig {
    fn default() -> Self {
        Self {
            max_file_size: 64 * 1024 * 1024,
        }
    }
}
