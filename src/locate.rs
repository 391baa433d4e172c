//! Byte pattern search over kernel images.
//!
//! Both searches work on word-aligned positions: the device tree blob and
//! the config area are linked as aligned data, so unaligned hits are noise.

use crate::fdt::{looks_like_fdt, FDT_MAGIC};
use crate::layout::WORD;
use tracing::trace;

/// Find `needle` as a contiguous byte sequence at a word-aligned offset of
/// `haystack`, returning the lowest such offset.
///
/// Candidates are picked by comparing the first word; the remaining whole
/// words are compared next and a byte-wise tail handles needles whose length
/// is not a multiple of the word size. After a mismatch the search continues
/// at the word following the candidate start, so overlapping candidates are
/// not skipped.
pub fn find_exact(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }

    let (first, rest) = needle.split_at(needle.len().min(WORD));
    let last_start = haystack.len() - needle.len();

    (0..=last_start).step_by(WORD).find(|&start| {
        let candidate = &haystack[start..start + needle.len()];
        candidate[..first.len()] == *first && matches_rest(&candidate[first.len()..], rest)
    })
}

/// `hay` and `rest` have equal length.
fn matches_rest(hay: &[u8], rest: &[u8]) -> bool {
    let words = rest.chunks_exact(WORD);
    let tail = words.remainder();
    let mut hay_words = hay.chunks_exact(WORD);

    for word in words {
        if hay_words.next() != Some(word) {
            return false;
        }
    }
    hay_words.remainder() == tail
}

/// Find the first word-aligned occurrence of `signature` (stored big-endian)
/// that `validate` accepts.
///
/// `validate` receives the candidate offset and only runs on signature hits.
pub fn find_signature<F>(haystack: &[u8], signature: u32, mut validate: F) -> Option<usize>
where
    F: FnMut(usize) -> bool,
{
    let pattern = signature.to_be_bytes();
    haystack
        .chunks_exact(WORD)
        .enumerate()
        .filter(|(_, word)| **word == pattern)
        .map(|(index, _)| index * WORD)
        .find(|&offset| {
            let accepted = validate(offset);
            trace!(offset, accepted, "Signature hit");
            accepted
        })
}

/// Find the first plausible flattened device tree in `haystack`.
pub fn find_device_tree(haystack: &[u8]) -> Option<usize> {
    find_signature(haystack, FDT_MAGIC, |offset| {
        looks_like_fdt(&haystack[offset..])
    })
}
