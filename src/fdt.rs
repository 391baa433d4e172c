//! Flattened device tree header checks.
//!
//! Only the header is inspected; it is enough to tell a real blob from a
//! stray occurrence of the magic. All header fields are big-endian.

use crate::layout::{EndianRead, Endianness};

/// Flattened device tree magic
pub const FDT_MAGIC: u32 = 0xd00d_feed;
/// Size of a version 17 header
pub const FDT_HEADER_SIZE: usize = 40;
/// Newest format version this check knows about
const FDT_MAX_COMPAT_VERSION: u32 = 17;
/// Headers claiming a newer version than this are not believed
const FDT_MAX_VERSION: u32 = 32;

/// FDT header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FdtHeader {
    pub magic: u32,
    pub total_size: u32,
    pub off_dt_struct: u32,
    pub off_dt_strings: u32,
    pub off_mem_rsvmap: u32,
    pub version: u32,
    pub last_comp_version: u32,
    pub boot_cpuid_phys: u32,
    pub size_dt_strings: u32,
    pub size_dt_struct: u32,
}

impl FdtHeader {
    /// Read the header fields at the start of `data`.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let field = |index: usize| data.read_u32(index * 4, Endianness::Big).ok();
        Some(Self {
            magic: field(0)?,
            total_size: field(1)?,
            off_dt_struct: field(2)?,
            off_dt_strings: field(3)?,
            off_mem_rsvmap: field(4)?,
            version: field(5)?,
            last_comp_version: field(6)?,
            boot_cpuid_phys: field(7)?,
            size_dt_strings: field(8)?,
            size_dt_struct: field(9)?,
        })
    }

    /// Header sanity: magic, a total size that fits in `available` bytes,
    /// block offsets inside the blob and coherent version fields.
    pub fn is_plausible(&self, available: usize) -> bool {
        if self.magic != FDT_MAGIC {
            return false;
        }

        let total = self.total_size as u64;
        if total < FDT_HEADER_SIZE as u64 || total > available as u64 {
            return false;
        }

        if !(1..=FDT_MAX_COMPAT_VERSION).contains(&self.last_comp_version)
            || self.version < self.last_comp_version
            || self.version > FDT_MAX_VERSION
        {
            return false;
        }

        let inside = |offset: u32, size: u32| offset as u64 + size as u64 <= total;
        if (self.off_mem_rsvmap as usize) < FDT_HEADER_SIZE
            || !inside(self.off_mem_rsvmap, 0)
            || !inside(self.off_dt_struct, 0)
            || !inside(self.off_dt_strings, 0)
        {
            return false;
        }

        // block sizes exist from version 17 (strings from 3)
        if self.version >= 17 && !inside(self.off_dt_struct, self.size_dt_struct) {
            return false;
        }
        if self.version >= 3 && !inside(self.off_dt_strings, self.size_dt_strings) {
            return false;
        }
        true
    }
}

/// Whether `data` starts with a plausible device tree blob.
pub fn looks_like_fdt(data: &[u8]) -> bool {
    FdtHeader::parse(data).is_some_and(|header| header.is_plausible(data.len()))
}
