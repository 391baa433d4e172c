//! Entry tags of the kernel config area.
//!
//! Ordinals are fixed by the kernel headers. The device tree sub-revisions
//! occupy one contiguous block and are recognized by range membership.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const TAG_UNDEF: u32 = 0;
pub const TAG_MODULE_MEMORY: u32 = 1;
pub const TAG_VERSION_INFO: u32 = 2;
pub const TAG_HW_CONFIG: u32 = 3;
pub const TAG_CACHE_CONFIG: u32 = 4;
pub const DEVICE_TREE_SUBREV_FIRST: u32 = 5;
pub const DEVICE_TREE_SUBREV_LAST: u32 = 14;
pub const TAG_AVMNET: u32 = 15;
/// Terminator tag and largest valid ordinal.
pub const TAG_LAST: u32 = 16;

/// Number of device tree sub-revision slots.
pub const SUBREV_MAX: u8 = (DEVICE_TREE_SUBREV_LAST - DEVICE_TREE_SUBREV_FIRST + 1) as u8;

/// Config area entry tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigTag {
    Undef,
    ModuleMemory,
    VersionInfo,
    HwConfig,
    CacheConfig,
    /// Device tree for hardware sub-revision 0..=9
    DeviceTree(u8),
    AvmNet,
    Last,
    /// Ordinal above `TAG_LAST`
    Unknown(u32),
}

impl ConfigTag {
    /// Tag of the device tree slot for `subrev`, if such a slot exists.
    pub fn device_tree(subrev: u8) -> Option<Self> {
        (subrev < SUBREV_MAX).then_some(ConfigTag::DeviceTree(subrev))
    }

    pub fn raw(&self) -> u32 {
        match *self {
            ConfigTag::Undef => TAG_UNDEF,
            ConfigTag::ModuleMemory => TAG_MODULE_MEMORY,
            ConfigTag::VersionInfo => TAG_VERSION_INFO,
            ConfigTag::HwConfig => TAG_HW_CONFIG,
            ConfigTag::CacheConfig => TAG_CACHE_CONFIG,
            ConfigTag::DeviceTree(subrev) => DEVICE_TREE_SUBREV_FIRST + subrev as u32,
            ConfigTag::AvmNet => TAG_AVMNET,
            ConfigTag::Last => TAG_LAST,
            ConfigTag::Unknown(raw) => raw,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, ConfigTag::Unknown(_))
    }

    pub fn is_device_tree(&self) -> bool {
        matches!(self, ConfigTag::DeviceTree(_))
    }

    pub fn device_tree_subrev(&self) -> Option<u8> {
        match *self {
            ConfigTag::DeviceTree(subrev) => Some(subrev),
            _ => None,
        }
    }
}

impl From<u32> for ConfigTag {
    fn from(val: u32) -> Self {
        match val {
            TAG_UNDEF => ConfigTag::Undef,
            TAG_MODULE_MEMORY => ConfigTag::ModuleMemory,
            TAG_VERSION_INFO => ConfigTag::VersionInfo,
            TAG_HW_CONFIG => ConfigTag::HwConfig,
            TAG_CACHE_CONFIG => ConfigTag::CacheConfig,
            DEVICE_TREE_SUBREV_FIRST..=DEVICE_TREE_SUBREV_LAST => {
                ConfigTag::DeviceTree((val - DEVICE_TREE_SUBREV_FIRST) as u8)
            }
            TAG_AVMNET => ConfigTag::AvmNet,
            TAG_LAST => ConfigTag::Last,
            other => ConfigTag::Unknown(other),
        }
    }
}

impl fmt::Display for ConfigTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigTag::Undef => write!(f, "undef"),
            ConfigTag::ModuleMemory => write!(f, "module_memory"),
            ConfigTag::VersionInfo => write!(f, "version_info"),
            ConfigTag::HwConfig => write!(f, "hw_config"),
            ConfigTag::CacheConfig => write!(f, "cache_config"),
            ConfigTag::DeviceTree(subrev) => write!(f, "device_tree_subrev_{}", subrev),
            ConfigTag::AvmNet => write!(f, "avmnet"),
            ConfigTag::Last => write!(f, "last"),
            ConfigTag::Unknown(raw) => write!(f, "unknown({:#x})", raw),
        }
    }
}
