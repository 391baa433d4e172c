//! Locating, extracting and analyzing the config area of a whole kernel image.
//!
//! The area is found through the device tree it carries: the blob is searched
//! in the image, the page holding it is taken as the first candidate area
//! start, and a few earlier pages are tried when the blob is not in the first
//! page of the area. Every candidate goes through byte order detection on its
//! own.

use crate::config::{AnalysisConfig, LocatorConfig};
use crate::detect::EndiannessDetector;
use crate::error::{ConfigAreaError, Result};
use crate::io::KernelImage;
use crate::layout::{align_down, Endianness};
use crate::locate::{find_device_tree, find_exact};
use crate::report::AreaSummary;
use crate::span_trace;
use crate::table::{relocate_with_config, RelocatedTable};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, trace};

/// How the device tree used as anchor was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DtbSource {
    /// Exact match of a caller supplied blob
    Supplied,
    /// First plausible FDT header in the image
    Signature,
}

/// Where a config area sits in an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaLocation {
    pub dtb_offset: usize,
    pub area_offset: usize,
    pub byte_order: Endianness,
    pub source: DtbSource,
}

/// Offset of the anchor device tree in `image`.
pub fn locate_dtb(image: &[u8], dtb: Option<&[u8]>) -> Option<(usize, DtbSource)> {
    match dtb {
        Some(blob) => find_exact(image, blob).map(|offset| (offset, DtbSource::Supplied)),
        None => find_device_tree(image).map(|offset| (offset, DtbSource::Signature)),
    }
}

/// Find the config area of `image`.
///
/// With `dtb` the blob is searched verbatim, otherwise the first plausible
/// device tree header is used.
pub fn find_config_area(
    image: &[u8],
    dtb: Option<&[u8]>,
    config: &AnalysisConfig,
) -> Option<AreaLocation> {
    let (dtb_offset, source) = locate_dtb(image, dtb)?;
    search_pages(image, dtb_offset, source, config)
}

fn search_pages(
    image: &[u8],
    dtb_offset: usize,
    source: DtbSource,
    config: &AnalysisConfig,
) -> Option<AreaLocation> {
    let locator = &config.locator;
    let detector = EndiannessDetector::new(&config.detection);
    let page = align_down(dtb_offset, locator.area_alignment);
    let step = locator.area_alignment.max(1);

    debug!(dtb_offset, page, ?source, "Searching config area");

    (0..=locator.max_pages_back)
        .map_while(|back| back.checked_mul(step).and_then(|delta| page.checked_sub(delta)))
        .find_map(|candidate| {
            let end = candidate
                .saturating_add(locator.area_size)
                .min(image.len());
            match detector.detect(&image[candidate..end]) {
                Ok(byte_order) => Some(AreaLocation {
                    dtb_offset,
                    area_offset: candidate,
                    byte_order,
                    source,
                }),
                Err(reason) => {
                    trace!(candidate, %reason, "Candidate rejected");
                    None
                }
            }
        })
}

/// The area dump: `area_size` bytes from the area start, clamped to the end
/// of the image.
pub fn extract_config_area<'a>(
    image: &'a [u8],
    location: &AreaLocation,
    locator: &LocatorConfig,
) -> &'a [u8] {
    let start = location.area_offset.min(image.len());
    let end = start.saturating_add(locator.area_size).min(image.len());
    &image[start..end]
}

/// Locate and relocate the config area of `image`.
pub fn analyze<'a>(
    image: &'a [u8],
    dtb: Option<&[u8]>,
    config: &AnalysisConfig,
) -> Result<RelocatedTable<'a>> {
    let span = span_trace!("analyze", image_len = image.len());
    let _guard = span.enter();

    let (dtb_offset, source) =
        locate_dtb(image, dtb).ok_or(ConfigAreaError::AreaNotFound { dtb_found: false })?;
    let location = search_pages(image, dtb_offset, source, config)
        .ok_or(ConfigAreaError::AreaNotFound { dtb_found: true })?;

    let size = config
        .locator
        .area_size
        .min(image.len() - location.area_offset);
    let table = relocate_with_config(image, location.area_offset, size, &config.detection)?;

    info!(
        area_offset = location.area_offset,
        dtb_offset = location.dtb_offset,
        order = %location.byte_order,
        entries = table.len(),
        "Config area found"
    );
    Ok(table)
}

/// Map `path` (and the optional known device tree at `dtb_path`) and
/// summarize its config area.
pub fn analyze_file<P: AsRef<Path>>(
    path: P,
    dtb_path: Option<&Path>,
    config: &AnalysisConfig,
) -> Result<AreaSummary> {
    let image = KernelImage::open(path, &config.io)?;
    let dtb = dtb_path
        .map(|dtb_path| KernelImage::open(dtb_path, &config.io))
        .transpose()?;

    let table = analyze(image.as_bytes(), dtb.as_ref().map(KernelImage::as_bytes), config)?;
    Ok(AreaSummary::from_table(&table))
}
