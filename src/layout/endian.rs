//! Byte order handling for config area words.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Size of every integer and pointer field in the config area.
pub const WORD: usize = 4;

/// A read that ran past the end of the available bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("truncated at {offset:#x}, needed {needed} bytes")]
pub struct Truncated {
    pub offset: usize,
    pub needed: usize,
}

/// Byte order of multi-byte fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    /// Little-endian byte order
    Little,
    /// Big-endian byte order
    Big,
}

impl Endianness {
    /// Byte order of the host running the analysis.
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            Endianness::Little
        } else {
            Endianness::Big
        }
    }

    /// The opposite byte order.
    pub const fn swapped(self) -> Self {
        match self {
            Endianness::Little => Endianness::Big,
            Endianness::Big => Endianness::Little,
        }
    }

    /// Whether values in this order differ from a plain host-order read.
    pub fn needs_swap(self) -> bool {
        self != Self::native()
    }

    pub fn u32_from_bytes(self, bytes: [u8; WORD]) -> u32 {
        match self {
            Endianness::Little => u32::from_le_bytes(bytes),
            Endianness::Big => u32::from_be_bytes(bytes),
        }
    }

    pub fn u32_to_bytes(self, value: u32) -> [u8; WORD] {
        match self {
            Endianness::Little => value.to_le_bytes(),
            Endianness::Big => value.to_be_bytes(),
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endianness::Little => f.write_str("little-endian"),
            Endianness::Big => f.write_str("big-endian"),
        }
    }
}

/// Extension trait for reading config area fields from byte slices
pub trait EndianRead {
    fn read_u32(&self, offset: usize, order: Endianness) -> Result<u32, Truncated>;
    fn read_slice(&self, offset: usize, len: usize) -> Result<&[u8], Truncated>;
    fn read_cstring(&self, offset: usize) -> Result<&[u8], Truncated>;
}

impl EndianRead for [u8] {
    #[inline]
    fn read_u32(&self, offset: usize, order: Endianness) -> Result<u32, Truncated> {
        self.get(offset..offset.saturating_add(WORD))
            .and_then(|b| b.try_into().ok())
            .map(|b| order.u32_from_bytes(b))
            .ok_or(Truncated {
                offset,
                needed: WORD,
            })
    }

    #[inline]
    fn read_slice(&self, offset: usize, len: usize) -> Result<&[u8], Truncated> {
        offset
            .checked_add(len)
            .and_then(|end| self.get(offset..end))
            .ok_or(Truncated { offset, needed: len })
    }

    /// Bytes up to (not including) the NUL terminator. A string that runs to
    /// the end of the slice without a terminator is truncated.
    fn read_cstring(&self, offset: usize) -> Result<&[u8], Truncated> {
        let slice = self.get(offset..).ok_or(Truncated { offset, needed: 1 })?;
        memchr::memchr(0, slice)
            .map(|end| &slice[..end])
            .ok_or(Truncated {
                offset,
                needed: slice.len() + 1,
            })
    }
}

/// Align a value down to the specified power-of-two alignment
pub fn align_down(value: usize, alignment: usize) -> usize {
    if alignment <= 1 {
        value
    } else {
        value & !(alignment - 1)
    }
}

/// Text of a zero padded field, cut at the first NUL.
pub fn padded_str(field: &[u8]) -> std::borrow::Cow<'_, str> {
    let end = memchr::memchr(0, field).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end])
}
