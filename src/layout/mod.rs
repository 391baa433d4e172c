//! Binary layout of the kernel config area
//!
//! Field readers, the tag enumeration and the record shapes shared by the
//! detector and the relocator.

pub mod endian;
pub mod records;
pub mod tags;

pub use endian::{align_down, EndianRead, Endianness, Truncated, WORD};
pub use records::{ModuleMemory, VersionInfo, ENTRY_SIZE, VERSION_INFO_SIZE};
pub use tags::{ConfigTag, SUBREV_MAX, TAG_LAST};

/// Mask that yields the 4 KiB aligned link-time base of the area.
pub const LINK_BASE_MASK: u32 = 0xFFFF_F000;
