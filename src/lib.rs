//! Analysis of the AVM kernel config area.
//!
//! AVM router kernels carry a table of tagged entries (module memory
//! reservations, version strings, per hardware revision device trees) linked
//! into a 4 KiB aligned area. This crate finds that area in a kernel image,
//! infers its byte order and rebases its link-time pointers so every payload
//! can be read from the image buffer.

/// Binary layout: field readers, tags and record shapes
pub mod layout;

/// Byte order detection of a candidate area
pub mod detect;

/// Pointer relocation and typed entries
pub mod table;

/// Device tree header checks
pub mod fdt;

/// Word-aligned pattern search
pub mod locate;

/// Whole-image pipeline
pub mod area;

/// Serializable summaries
pub mod report;

/// Configuration management
pub mod config;

/// Error types
pub mod error;

/// Memory-mapped input files
pub mod io;

/// Hash helpers
pub mod hashing;

/// Logging and tracing infrastructure
pub mod logging;

/// Synthetic areas for tests and benches
#[doc(hidden)]
pub mod testing;

pub use area::{
    analyze, analyze_file, extract_config_area, find_config_area, AreaLocation, DtbSource,
};
pub use config::AnalysisConfig;
pub use detect::{detect_byte_order, DetectionFailure, EndiannessDetector};
pub use error::{ConfigAreaError, Result};
pub use layout::{ConfigTag, Endianness, ModuleMemory, VersionInfo};
pub use report::AreaSummary;
pub use table::{relocate, ConfigEntry, RelocatedTable, RelocationFailure};
