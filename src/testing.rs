//! Synthetic config areas and kernel images.
//!
//! Shared by unit tests, integration tests and benches so that all of them
//! build the same layout: the table pointer at offset 0, the entry array at
//! [`ENTRIES_OFFSET`], then each payload 16 byte aligned.

use crate::fdt::FDT_MAGIC;
use crate::layout::{Endianness, TAG_LAST};

/// Link-time address of the area start
pub const LINK_BASE: u32 = 0x8043_2000;
pub const ENTRIES_OFFSET: usize = 0x10;
/// Byte around embedded areas
pub const FILLER: u8 = 0x5a;

pub enum Payload {
    ModuleMemory(Vec<(&'static str, u32)>),
    Version(&'static str, &'static str, &'static str),
    DeviceTree(Vec<u8>),
    Raw(Vec<u8>),
}

pub struct AreaBuilder {
    order: Endianness,
    size: usize,
    terminator_tag: u32,
    entries: Vec<(u32, Payload)>,
}

fn align_up(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

impl AreaBuilder {
    pub fn new(order: Endianness) -> Self {
        Self {
            order,
            size: 0x2000,
            terminator_tag: TAG_LAST,
            entries: Vec::new(),
        }
    }

    pub fn entry(mut self, tag: u32, payload: Payload) -> Self {
        self.entries.push((tag, payload));
        self
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn terminator_tag(mut self, tag: u32) -> Self {
        self.terminator_tag = tag;
        self
    }

    fn put(&self, area: &mut [u8], offset: usize, value: u32) {
        area[offset..offset + 4].copy_from_slice(&self.order.u32_to_bytes(value));
    }

    fn pointer(offset: usize) -> u32 {
        LINK_BASE + offset as u32
    }

    /// Area offset of the first payload.
    pub fn first_payload_offset(&self) -> usize {
        align_up(ENTRIES_OFFSET + (self.entries.len() + 1) * 8, 16)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut area = vec![0u8; self.size];
        self.put(&mut area, 0, Self::pointer(ENTRIES_OFFSET));

        let table_end = ENTRIES_OFFSET + (self.entries.len() + 1) * 8;
        let mut cursor = self.first_payload_offset();
        for (index, (tag, payload)) in self.entries.iter().enumerate() {
            let at = ENTRIES_OFFSET + index * 8;
            self.put(&mut area, at, *tag);
            self.put(&mut area, at + 4, Self::pointer(cursor));
            let end = self.write_payload(&mut area, cursor, payload);
            cursor = align_up(end, 16);
        }
        self.put(&mut area, table_end - 8, self.terminator_tag);
        area
    }

    fn write_payload(&self, area: &mut [u8], at: usize, payload: &Payload) -> usize {
        match payload {
            Payload::ModuleMemory(modules) => {
                let mut name_at = at + (modules.len() + 1) * 8;
                for (index, (name, size)) in modules.iter().enumerate() {
                    let record = at + index * 8;
                    self.put(area, record, Self::pointer(name_at));
                    self.put(area, record + 4, *size);
                    area[name_at..name_at + name.len()].copy_from_slice(name.as_bytes());
                    name_at = align_up(name_at + name.len() + 1, 4);
                }
                name_at
            }
            Payload::Version(build, revision, firmware) => {
                area[at..at + build.len()].copy_from_slice(build.as_bytes());
                area[at + 32..at + 32 + revision.len()].copy_from_slice(revision.as_bytes());
                area[at + 64..at + 64 + firmware.len()].copy_from_slice(firmware.as_bytes());
                at + 192
            }
            Payload::DeviceTree(bytes) | Payload::Raw(bytes) => {
                area[at..at + bytes.len()].copy_from_slice(bytes);
                at + bytes.len()
            }
        }
    }
}

/// Smallest well-formed device tree: an empty root node.
pub fn minimal_fdt(boot_cpuid: u32) -> Vec<u8> {
    // magic, totalsize, struct/strings/reserve map offsets, version,
    // last compatible version, boot cpu, strings size, struct size
    let header = [FDT_MAGIC, 72, 56, 72, 40, 17, 16, boot_cpuid, 0, 16];
    let mut blob: Vec<u8> = header.iter().flat_map(|v| v.to_be_bytes()).collect();
    blob.extend_from_slice(&[0u8; 16]);
    for token in [1u32, 0, 2, 9] {
        blob.extend_from_slice(&token.to_be_bytes());
    }
    blob
}

/// Deterministic xorshift noise.
pub fn pseudo_random(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(0x9e37_79b9_7f4a_7c15) | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}

/// Place `area` at `offset` inside an image of `len` bytes of filler.
pub fn embed(area: &[u8], offset: usize, len: usize) -> Vec<u8> {
    let mut image = vec![FILLER; len];
    image[offset..offset + area.len()].copy_from_slice(area);
    image
}
