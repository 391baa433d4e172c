//! Relocation and typed traversal of a kernel config area.
//!
//! Every pointer in the area is a link-time address. Relocation maps each one
//! to an offset in the analyzed buffer:
//!
//! ```text
//! local = value - kernel_link_base + local_base
//! ```
//!
//! where `kernel_link_base` is the table pointer masked to its 4 KiB page and
//! `local_base` is the buffer offset of the area. The buffer is never
//! modified; the result is an owned list of entries whose payloads borrow
//! validated slices of the input.

use crate::config::DetectionConfig;
use crate::detect::{DetectionFailure, EndiannessDetector};
use crate::layout::records::{device_tree_size, MODULE_MEMORY_RECORD_SIZE};
use crate::layout::{
    ConfigTag, EndianRead, Endianness, ModuleMemory, Truncated, VersionInfo, ENTRY_SIZE,
    LINK_BASE_MASK, WORD,
};
use thiserror::Error;
use tracing::{debug, trace};

/// Relocation failures. None of them leaves partial state behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RelocationFailure {
    #[error("not a config table: {0}")]
    NotAConfigTable(#[from] DetectionFailure),

    #[error("pointer {pointer:#010x} at {offset:#x} falls outside the area")]
    DanglingPointer { offset: usize, pointer: u32 },

    #[error("record at {offset:#x} extends past the area end, needed {needed} bytes")]
    TruncatedRecord { offset: usize, needed: usize },

    #[error("region {offset:#x}+{size:#x} exceeds the buffer of {buffer_len:#x} bytes")]
    RegionOutOfBounds {
        offset: usize,
        size: usize,
        buffer_len: usize,
    },
}

impl From<Truncated> for RelocationFailure {
    fn from(err: Truncated) -> Self {
        RelocationFailure::TruncatedRecord {
            offset: err.offset,
            needed: err.needed,
        }
    }
}

/// A typed, relocated config area entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEntry<'a> {
    /// Module memory reservations, in table order
    ModuleMemory(Vec<ModuleMemory<'a>>),
    VersionInfo(VersionInfo<'a>),
    /// Device tree blob for one hardware sub-revision
    DeviceTree {
        subrev: u8,
        offset: usize,
        blob: &'a [u8],
    },
    /// Entry with a valid tag whose payload layout is not interpreted
    Opaque { tag: ConfigTag, offset: usize },
}

impl ConfigEntry<'_> {
    pub fn tag(&self) -> ConfigTag {
        match self {
            ConfigEntry::ModuleMemory(_) => ConfigTag::ModuleMemory,
            ConfigEntry::VersionInfo(_) => ConfigTag::VersionInfo,
            ConfigEntry::DeviceTree { subrev, .. } => ConfigTag::DeviceTree(*subrev),
            ConfigEntry::Opaque { tag, .. } => *tag,
        }
    }
}

/// A config area with all pointers rebased into the analyzed buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocatedTable<'a> {
    byte_order: Endianness,
    link_base: u32,
    local_base: usize,
    region_size: usize,
    entries_offset: usize,
    entries: Vec<ConfigEntry<'a>>,
}

impl<'a> RelocatedTable<'a> {
    pub fn byte_order(&self) -> Endianness {
        self.byte_order
    }

    /// Link-time address of the area start.
    pub fn link_base(&self) -> u32 {
        self.link_base
    }

    /// Buffer offset of the area start.
    pub fn local_base(&self) -> usize {
        self.local_base
    }

    pub fn region_size(&self) -> usize {
        self.region_size
    }

    /// Buffer offset of the entry array.
    pub fn entries_offset(&self) -> usize {
        self.entries_offset
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConfigEntry<'a>> {
        self.entries.iter()
    }

    pub fn has_module_memory(&self) -> bool {
        self.module_memory().is_some()
    }

    pub fn has_version_info(&self) -> bool {
        self.version_info().is_some()
    }

    pub fn has_device_tree(&self, subrev: u8) -> bool {
        self.device_tree(subrev).is_some()
    }

    /// Records of the first module memory entry.
    pub fn module_memory(&self) -> Option<&[ModuleMemory<'a>]> {
        self.iter().find_map(|entry| match entry {
            ConfigEntry::ModuleMemory(modules) => Some(modules.as_slice()),
            _ => None,
        })
    }

    pub fn version_info(&self) -> Option<&VersionInfo<'a>> {
        self.iter().find_map(|entry| match entry {
            ConfigEntry::VersionInfo(info) => Some(info),
            _ => None,
        })
    }

    /// `(subrev, blob)` for every device tree entry, in table order.
    pub fn device_trees(&self) -> impl Iterator<Item = (u8, &'a [u8])> + '_ {
        self.iter().filter_map(|entry| match entry {
            ConfigEntry::DeviceTree { subrev, blob, .. } => Some((*subrev, *blob)),
            _ => None,
        })
    }

    pub fn device_tree(&self, subrev: u8) -> Option<&'a [u8]> {
        self.device_trees()
            .find(|(candidate, _)| *candidate == subrev)
            .map(|(_, blob)| blob)
    }
}

impl<'a> IntoIterator for RelocatedTable<'a> {
    type Item = ConfigEntry<'a>;
    type IntoIter = std::vec::IntoIter<ConfigEntry<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'t, 'a> IntoIterator for &'t RelocatedTable<'a> {
    type Item = &'t ConfigEntry<'a>;
    type IntoIter = std::slice::Iter<'t, ConfigEntry<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Rebases link-time pointers and reads fields inside one area.
struct Relocator<'a> {
    /// Buffer cut at the area end, so reads cannot leave the area
    data: &'a [u8],
    order: Endianness,
    link_base: u32,
    local_base: usize,
}

impl<'a> Relocator<'a> {
    fn read(&self, offset: usize) -> Result<u32, RelocationFailure> {
        Ok(self.data.read_u32(offset, self.order)?)
    }

    /// Map the pointer stored at `offset` into the buffer.
    fn rebase(&self, offset: usize, pointer: u32) -> Result<usize, RelocationFailure> {
        pointer
            .checked_sub(self.link_base)
            .and_then(|delta| self.local_base.checked_add(delta as usize))
            .filter(|&local| local < self.data.len())
            .ok_or(RelocationFailure::DanglingPointer { offset, pointer })
    }

    fn entries(&self, mut at: usize) -> Result<Vec<ConfigEntry<'a>>, RelocationFailure> {
        let mut entries = Vec::new();
        loop {
            let tag = ConfigTag::from(self.read(at)?);
            let payload = self.read(at + WORD)?;
            if payload == 0 {
                trace!(offset = at, tag = %tag, "Null payload ends the table");
                break;
            }
            if matches!(tag, ConfigTag::Last | ConfigTag::Unknown(_)) {
                trace!(offset = at, tag = %tag, "Terminator reached");
                break;
            }

            let target = self.rebase(at + WORD, payload)?;
            entries.push(self.entry(tag, target)?);
            at += ENTRY_SIZE;
        }
        Ok(entries)
    }

    fn entry(&self, tag: ConfigTag, target: usize) -> Result<ConfigEntry<'a>, RelocationFailure> {
        Ok(match tag {
            ConfigTag::ModuleMemory => ConfigEntry::ModuleMemory(self.module_memory(target)?),
            ConfigTag::VersionInfo => ConfigEntry::VersionInfo(VersionInfo::parse(self.data, target)?),
            ConfigTag::DeviceTree(subrev) => {
                let size = device_tree_size(self.data, target)? as usize;
                ConfigEntry::DeviceTree {
                    subrev,
                    offset: target,
                    blob: self.data.read_slice(target, size)?,
                }
            }
            tag => ConfigEntry::Opaque {
                tag,
                offset: target,
            },
        })
    }

    fn module_memory(&self, mut at: usize) -> Result<Vec<ModuleMemory<'a>>, RelocationFailure> {
        let mut modules = Vec::new();
        loop {
            let name_ref = self.read(at)?;
            if name_ref == 0 {
                break;
            }
            let size = self.read(at + WORD)?;
            let name = self.data.read_cstring(self.rebase(at, name_ref)?)?;
            modules.push(ModuleMemory { name, size });
            at += MODULE_MEMORY_RECORD_SIZE;
        }
        Ok(modules)
    }
}

/// Relocate the config area at `buffer[region_offset..region_offset + region_size]`.
///
/// `region_offset` is the start of the table pointer cell, which is also the
/// 4 KiB aligned start of the area.
pub fn relocate(
    buffer: &[u8],
    region_offset: usize,
    region_size: usize,
) -> Result<RelocatedTable<'_>, RelocationFailure> {
    relocate_with_config(buffer, region_offset, region_size, &DetectionConfig::default())
}

/// [`relocate`] with an explicit detection configuration.
pub fn relocate_with_config<'a>(
    buffer: &'a [u8],
    region_offset: usize,
    region_size: usize,
    config: &DetectionConfig,
) -> Result<RelocatedTable<'a>, RelocationFailure> {
    let region_end = region_offset
        .checked_add(region_size)
        .filter(|&end| end <= buffer.len())
        .ok_or(RelocationFailure::RegionOutOfBounds {
            offset: region_offset,
            size: region_size,
            buffer_len: buffer.len(),
        })?;

    let order = EndiannessDetector::new(config).detect(&buffer[region_offset..region_end])?;

    let data = &buffer[..region_end];
    let head = data.read_u32(region_offset, order)?;
    let relocator = Relocator {
        data,
        order,
        link_base: head & LINK_BASE_MASK,
        local_base: region_offset,
    };
    let entries_offset = relocator.rebase(region_offset, head)?;
    let entries = relocator.entries(entries_offset)?;

    debug!(
        order = %order,
        link_base = format_args!("{:#010x}", relocator.link_base),
        local_base = region_offset,
        entries = entries.len(),
        "Config area relocated"
    );

    Ok(RelocatedTable {
        byte_order: order,
        link_base: relocator.link_base,
        local_base: region_offset,
        region_size,
        entries_offset,
        entries,
    })
}
