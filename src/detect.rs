//! Byte order detection for kernel config areas.
//!
//! The area has no magic number or version field. Its byte order is inferred
//! from the shape of the data instead:
//!
//! - a word with more than one non-zero byte is taken for a pointer
//! - a word with exactly one non-zero byte is taken for a tag, since tags are
//!   small ordinals
//! - zero words are padding or the terminator's null payload
//!
//! The same pass validates the structure, so a region that is not a config
//! area is rejected here and callers need no separate plausibility check.

use crate::config::DetectionConfig;
use crate::layout::{Endianness, LINK_BASE_MASK, TAG_LAST, WORD};
use thiserror::Error;
use tracing::{debug, trace};

/// Reasons a region is rejected as a config area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DetectionFailure {
    #[error("region does not start with a table pointer ({horizon:#x} bytes scanned)")]
    MissingTablePointer { horizon: usize },

    #[error("no entry array after the table pointer within {horizon:#x} bytes")]
    MissingArrayStart { horizon: usize },

    #[error("entry array not terminated within {horizon:#x} bytes")]
    MissingArrayEnd { horizon: usize },

    #[error("terminator at {offset:#x} is not aligned to the entry array")]
    MisalignedTerminator { offset: usize },

    #[error("terminator entry at {offset:#x} has a zero tag")]
    ZeroTerminatorTag { offset: usize },

    #[error("invalid tag {tag:#x} at {offset:#x} read as {order}")]
    InvalidTag {
        offset: usize,
        tag: u32,
        order: Endianness,
    },

    #[error("table pointer {pointer:#010x} does not address the entry array at {array_start:#x}")]
    TablePointerMismatch { pointer: u32, array_start: usize },

    #[error("payload pointer {pointer:#010x} at {offset:#x} outside ({base:#010x}, {base:#010x} + {size:#x}]")]
    PointerOutOfRange {
        offset: usize,
        pointer: u32,
        base: u32,
        size: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordClass {
    Zero,
    Tag,
    Pointer,
}

impl WordClass {
    fn of(word: &[u8]) -> Self {
        match word.iter().filter(|&&b| b != 0).count() {
            0 => WordClass::Zero,
            1 => WordClass::Tag,
            _ => WordClass::Pointer,
        }
    }
}

fn word_value(word: &[u8], order: Endianness) -> u32 {
    order.u32_from_bytes([word[0], word[1], word[2], word[3]])
}

/// Word indices of the entry array landmarks; the table pointer is word 0.
struct Scan<'r> {
    words: Vec<&'r [u8]>,
    /// First entry's tag
    array_start: usize,
    /// One past the terminator entry
    array_end: usize,
}

/// Infers and validates the byte order of a candidate config area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndiannessDetector {
    scan_horizon: usize,
}

impl Default for EndiannessDetector {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}

impl EndiannessDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            scan_horizon: config.scan_horizon,
        }
    }

    pub fn with_scan_horizon(scan_horizon: usize) -> Self {
        Self { scan_horizon }
    }

    pub fn scan_horizon(&self) -> usize {
        self.scan_horizon
    }

    /// Determine the byte order of the config area at the start of `region`.
    ///
    /// `region.len()` is the area size; every payload pointer must fall
    /// inside it. A single hypothesis is formed from the terminator tag and
    /// then validated; a failed validation rejects the region.
    pub fn detect(&self, region: &[u8]) -> Result<Endianness, DetectionFailure> {
        let scan = self.scan(region)?;
        let order = hypothesis(&scan)?;
        let payloads = validate_tags(&scan, order)?;
        let link_base = check_table_pointer(&scan, order)?;
        check_payload_range(&payloads, link_base, region.len())?;

        debug!(
            order = %order,
            link_base = format_args!("{:#010x}", link_base),
            entries_offset = scan.array_start * WORD,
            entries = payloads.len(),
            "Config area byte order detected"
        );
        Ok(order)
    }

    fn scan<'r>(&self, region: &'r [u8]) -> Result<Scan<'r>, DetectionFailure> {
        let horizon = self.scan_horizon.min(region.len());
        let words: Vec<&[u8]> = region[..horizon].chunks_exact(WORD).collect();

        // the table pointer cell is the first word of the area
        if words.first().map(|word| WordClass::of(word)) != Some(WordClass::Pointer) {
            trace!(horizon, "Region does not start with a pointer");
            return Err(DetectionFailure::MissingTablePointer { horizon });
        }

        let mut array_start = None;
        for (index, word) in words.iter().enumerate().skip(1) {
            match (WordClass::of(word), array_start) {
                (WordClass::Tag, None) => array_start = Some(index),
                (WordClass::Zero, Some(array_start)) => {
                    return Ok(Scan {
                        words,
                        array_start,
                        array_end: index + 1,
                    });
                }
                _ => {}
            }
        }

        trace!(horizon, ?array_start, "Config area landmarks incomplete");
        Err(match array_start {
            None => DetectionFailure::MissingArrayStart { horizon },
            Some(_) => DetectionFailure::MissingArrayEnd { horizon },
        })
    }
}

/// Pick the byte order from the terminator tag read in host order.
fn hypothesis(scan: &Scan<'_>) -> Result<Endianness, DetectionFailure> {
    let terminator = scan.array_end - 2;
    if (terminator - scan.array_start) % 2 != 0 {
        return Err(DetectionFailure::MisalignedTerminator {
            offset: terminator * WORD,
        });
    }

    let native = Endianness::native();
    let tag = word_value(scan.words[terminator], native);
    if tag == 0 {
        return Err(DetectionFailure::ZeroTerminatorTag {
            offset: terminator * WORD,
        });
    }

    let order = if tag > TAG_LAST { native.swapped() } else { native };
    trace!(terminator_tag = tag, order = %order, "Byte order hypothesis");
    Ok(order)
}

/// Walk the entries under `order`; returns `(offset, value)` of every
/// payload pointer seen. The walk ends at a `Last` tag or a null payload.
fn validate_tags(
    scan: &Scan<'_>,
    order: Endianness,
) -> Result<Vec<(usize, u32)>, DetectionFailure> {
    let mut payloads = Vec::new();
    let mut index = scan.array_start;

    while index + 1 < scan.array_end {
        let payload = scan.words[index + 1];
        if WordClass::of(payload) == WordClass::Zero {
            break;
        }

        let tag = word_value(scan.words[index], order);
        if tag > TAG_LAST {
            return Err(DetectionFailure::InvalidTag {
                offset: index * WORD,
                tag,
                order,
            });
        }

        payloads.push(((index + 1) * WORD, word_value(payload, order)));
        if tag == TAG_LAST {
            break;
        }
        index += 2;
    }

    Ok(payloads)
}

/// The table pointer's offset inside its 4 KiB page must equal the entry
/// array's offset inside the region. Returns the link-time base.
fn check_table_pointer(scan: &Scan<'_>, order: Endianness) -> Result<u32, DetectionFailure> {
    let pointer = word_value(scan.words[0], order);
    let link_base = pointer & LINK_BASE_MASK;
    let array_start = scan.array_start * WORD;

    if (pointer - link_base) as usize != array_start {
        return Err(DetectionFailure::TablePointerMismatch {
            pointer,
            array_start,
        });
    }
    Ok(link_base)
}

fn check_payload_range(
    payloads: &[(usize, u32)],
    base: u32,
    size: usize,
) -> Result<(), DetectionFailure> {
    for &(offset, pointer) in payloads {
        if pointer <= base || (pointer - base) as usize > size {
            return Err(DetectionFailure::PointerOutOfRange {
                offset,
                pointer,
                base,
                size,
            });
        }
    }
    Ok(())
}

/// Detect with the default scan horizon.
pub fn detect_byte_order(region: &[u8]) -> Result<Endianness, DetectionFailure> {
    EndiannessDetector::default().detect(region)
}
