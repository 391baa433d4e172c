//! Analysis of kernel images read from disk.

use avm_kernel_config::config::IOConfig;
use avm_kernel_config::io::error::IoError;
use avm_kernel_config::io::KernelImage;
use avm_kernel_config::layout::tags::DEVICE_TREE_SUBREV_FIRST;
use avm_kernel_config::{
    analyze, analyze_file, extract_config_area, find_config_area, AnalysisConfig,
    ConfigAreaError, Endianness,
};

use avm_kernel_config::testing::{embed, minimal_fdt, AreaBuilder, Payload};
use crate::common::test_utils::{create_temp_file, open_image};

fn image_bytes() -> Vec<u8> {
    let area = AreaBuilder::new(Endianness::Big)
        .entry(DEVICE_TREE_SUBREV_FIRST, Payload::DeviceTree(minimal_fdt(0)))
        .build();
    embed(&area, 0x2000, 0x8000)
}

#[test]
fn test_analyze_mapped_file() {
    let file = create_temp_file(&image_bytes());
    let image = open_image(&file);
    assert_eq!(image.size(), 0x8000);

    let table = analyze(image.as_bytes(), None, &AnalysisConfig::default()).unwrap();
    assert_eq!(table.local_base(), 0x2000);
    assert_eq!(table.device_tree(0), Some(&minimal_fdt(0)[..]));
}

#[test]
fn test_extracted_dump_relocates_at_zero() {
    let file = create_temp_file(&image_bytes());
    let image = open_image(&file);
    let config = AnalysisConfig::default();

    let location = find_config_area(image.as_bytes(), None, &config).unwrap();
    let dump = extract_config_area(image.as_bytes(), &location, &config.locator).to_vec();
    assert_eq!(image.read_at(location.area_offset, dump.len()), dump);

    let dump_file = create_temp_file(&dump);
    let dump_image = open_image(&dump_file);
    let table = avm_kernel_config::relocate(dump_image.as_bytes(), 0, dump.len()).unwrap();
    assert_eq!(table.local_base(), 0);
    assert!(table.has_device_tree(0));
}

#[test]
fn test_file_size_limit() {
    let file = create_temp_file(&image_bytes());
    let limits = IOConfig { max_file_size: 0x1000 };
    let err = KernelImage::open(file.path(), &limits).unwrap_err();
    assert!(matches!(err, IoError::FileTooLarge { limit: 0x1000, found: 0x8000 }));

    let err = ConfigAreaError::from(err);
    assert!(err.to_string().starts_with("I/O error"));
}

#[test]
fn test_analyze_file_with_known_device_tree() {
    let file = create_temp_file(&image_bytes());
    let dtb = create_temp_file(&minimal_fdt(0));
    let config = AnalysisConfig::default();

    let summary = analyze_file(file.path(), Some(dtb.path()), &config).unwrap();
    assert_eq!(summary.byte_order, Endianness::Big);
    assert_eq!(summary.local_base, 0x2000);
    assert_eq!(summary.device_trees.len(), 1);

    let other = create_temp_file(&minimal_fdt(5));
    let err = analyze_file(file.path(), Some(other.path()), &config).unwrap_err();
    assert!(matches!(err, ConfigAreaError::AreaNotFound { dtb_found: false }));
}

#[test]
fn test_analyze_file_size_limit() {
    let file = create_temp_file(&image_bytes());
    let mut config = AnalysisConfig::default();
    config.io.max_file_size = 0x1000;
    let err = analyze_file(file.path(), None, &config).unwrap_err();
    assert!(matches!(
        err,
        ConfigAreaError::Io(IoError::FileTooLarge { limit: 0x1000, found: 0x8000 })
    ));
}
