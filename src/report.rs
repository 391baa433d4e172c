//! Serializable summary of a relocated config area.

use crate::hashing::sha256_digest;
use crate::layout::Endianness;
use crate::table::{ConfigEntry, RelocatedTable};
use serde::{Deserialize, Serialize};

/// One module memory reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub name: String,
    pub size: u32,
}

/// Version strings of the firmware build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub build_number: String,
    pub source_revision: String,
    pub firmware_string: String,
}

/// A device tree blob identified by size and digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTreeSummary {
    pub subrev: u8,
    /// Offset of the blob in the analyzed buffer
    pub offset: usize,
    pub size: usize,
    pub sha256: String,
}

/// Owned summary of everything a [`RelocatedTable`] exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaSummary {
    pub byte_order: Endianness,
    pub link_base: u32,
    pub local_base: usize,
    pub entries_offset: usize,
    pub modules: Vec<ModuleSummary>,
    pub version: Option<VersionSummary>,
    pub device_trees: Vec<DeviceTreeSummary>,
    /// Raw tags of entries whose payload is not interpreted
    pub opaque_tags: Vec<u32>,
}

impl AreaSummary {
    pub fn from_table(table: &RelocatedTable<'_>) -> Self {
        let modules = table
            .module_memory()
            .unwrap_or_default()
            .iter()
            .map(|module| ModuleSummary {
                name: module.name_str().into_owned(),
                size: module.size,
            })
            .collect();

        let version = table.version_info().map(|info| VersionSummary {
            build_number: info.build_number_str().into_owned(),
            source_revision: info.source_revision_str().into_owned(),
            firmware_string: info.firmware_string_str().into_owned(),
        });

        let mut device_trees = Vec::new();
        let mut opaque_tags = Vec::new();
        for entry in table {
            match entry {
                ConfigEntry::DeviceTree {
                    subrev,
                    offset,
                    blob,
                } => device_trees.push(DeviceTreeSummary {
                    subrev: *subrev,
                    offset: *offset,
                    size: blob.len(),
                    sha256: sha256_digest(blob),
                }),
                ConfigEntry::Opaque { tag, .. } => opaque_tags.push(tag.raw()),
                _ => {}
            }
        }

        Self {
            byte_order: table.byte_order(),
            link_base: table.link_base(),
            local_base: table.local_base(),
            entries_offset: table.entries_offset(),
            modules,
            version,
            device_trees,
            opaque_tags,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
