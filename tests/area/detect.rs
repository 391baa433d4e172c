//! Byte order detection through the public API.

use avm_kernel_config::layout::tags::{
    DEVICE_TREE_SUBREV_FIRST, TAG_MODULE_MEMORY, TAG_VERSION_INFO,
};
use avm_kernel_config::{detect_byte_order, DetectionFailure, EndiannessDetector, Endianness};

use avm_kernel_config::testing::{minimal_fdt, AreaBuilder, Payload};

fn sample_area(order: Endianness) -> Vec<u8> {
    AreaBuilder::new(order)
        .entry(TAG_MODULE_MEMORY, Payload::ModuleMemory(vec![("wlan", 0x1000)]))
        .entry(TAG_VERSION_INFO, Payload::Version("1", "2", "3"))
        .entry(DEVICE_TREE_SUBREV_FIRST, Payload::DeviceTree(minimal_fdt(0)))
        .build()
}

#[test]
fn test_detects_both_orders() {
    for order in [Endianness::Little, Endianness::Big] {
        assert_eq!(detect_byte_order(&sample_area(order)), Ok(order));
    }
}

#[test]
fn test_swap_relative_to_host() {
    let foreign = Endianness::native().swapped();
    let order = detect_byte_order(&sample_area(foreign)).unwrap();
    assert!(order.needs_swap());

    let order = detect_byte_order(&sample_area(Endianness::native())).unwrap();
    assert!(!order.needs_swap());
}

#[test]
fn test_rejects_non_areas() {
    assert_eq!(
        detect_byte_order(&[0u8; 0x100]),
        Err(DetectionFailure::MissingTablePointer { horizon: 0x100 })
    );
    assert!(detect_byte_order(&minimal_fdt(0)).is_err());
    assert!(detect_byte_order(&[]).is_err());
}

#[test]
fn test_horizon_cuts_the_scan() {
    let area = sample_area(Endianness::Big);
    let detector = EndiannessDetector::with_scan_horizon(0x10);
    assert_eq!(detector.scan_horizon(), 0x10);
    assert!(matches!(
        detector.detect(&area),
        Err(DetectionFailure::MissingArrayStart { horizon: 0x10 })
    ));
}

#[test]
fn test_payload_beyond_region() {
    let area = sample_area(Endianness::Little);
    // the device tree payload sits past the first 0x60 bytes
    let result = detect_byte_order(&area[..0x60]);
    assert!(matches!(
        result,
        Err(DetectionFailure::PointerOutOfRange { .. })
    ));
}
