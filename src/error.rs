//! Error types for config area analysis.
//!
//! The detector and the relocator report their own typed failures; this
//! module gathers them for the file-level pipeline in [`crate::area`].

use crate::io::error::IoError;
use crate::table::RelocationFailure;
use thiserror::Error;

/// Main error type for pipeline operations.
#[derive(Debug, Error)]
pub enum ConfigAreaError {
    /// Reading or mapping the input failed
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// No device tree, or no page around it that holds a config area
    #[error("no config area found (device tree found: {dtb_found})")]
    AreaNotFound { dtb_found: bool },

    /// The located area could not be relocated
    #[error("relocation failed: {0}")]
    Relocation(#[from] RelocationFailure),

    /// Configuration could not be parsed
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ConfigAreaError>;
