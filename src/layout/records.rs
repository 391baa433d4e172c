//! Fixed-shape records referenced from config area entries

use crate::layout::endian::{padded_str, Endianness, EndianRead, Truncated, WORD};
use std::borrow::Cow;

/// `{ tag, payload_ref }`
pub const ENTRY_SIZE: usize = 2 * WORD;
/// `{ name_ref, size }`
pub const MODULE_MEMORY_RECORD_SIZE: usize = 2 * WORD;

pub const BUILD_NUMBER_LEN: usize = 32;
pub const SOURCE_REVISION_LEN: usize = 32;
pub const FIRMWARE_STRING_LEN: usize = 128;
pub const VERSION_INFO_SIZE: usize = BUILD_NUMBER_LEN + SOURCE_REVISION_LEN + FIRMWARE_STRING_LEN;

/// Offset of the device tree's total size field; always big-endian.
pub const DEVICE_TREE_SIZE_OFFSET: usize = WORD;

/// Memory reservation for one kernel module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMemory<'a> {
    /// Module name without its NUL terminator
    pub name: &'a [u8],
    /// Reserved size in bytes
    pub size: u32,
}

impl<'a> ModuleMemory<'a> {
    pub fn name_str(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.name)
    }
}

/// Firmware version record. Fields are zero padded and not necessarily
/// NUL-terminated within their width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo<'a> {
    pub build_number: &'a [u8],
    pub source_revision: &'a [u8],
    pub firmware_string: &'a [u8],
}

impl<'a> VersionInfo<'a> {
    /// Split a record starting at `offset`.
    pub fn parse(data: &'a [u8], offset: usize) -> Result<Self, Truncated> {
        let record = data.read_slice(offset, VERSION_INFO_SIZE)?;
        let (build_number, rest) = record.split_at(BUILD_NUMBER_LEN);
        let (source_revision, firmware_string) = rest.split_at(SOURCE_REVISION_LEN);
        Ok(Self {
            build_number,
            source_revision,
            firmware_string,
        })
    }

    pub fn build_number_str(&self) -> Cow<'a, str> {
        padded_str(self.build_number)
    }

    pub fn source_revision_str(&self) -> Cow<'a, str> {
        padded_str(self.source_revision)
    }

    pub fn firmware_string_str(&self) -> Cow<'a, str> {
        padded_str(self.firmware_string)
    }
}

/// Declared total size of the device tree blob at `offset`.
pub fn device_tree_size(data: &[u8], offset: usize) -> Result<u32, Truncated> {
    data.read_u32(offset.saturating_add(DEVICE_TREE_SIZE_OFFSET), Endianness::Big)
}
