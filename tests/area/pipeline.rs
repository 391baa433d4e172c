//! Whole-image pipeline: locate, extract, relocate, summarize.

use avm_kernel_config::layout::tags::{DEVICE_TREE_SUBREV_FIRST, TAG_HW_CONFIG, TAG_VERSION_INFO};
use avm_kernel_config::{
    analyze, extract_config_area, find_config_area, AnalysisConfig, AreaSummary,
    ConfigAreaError, DtbSource, Endianness,
};

use avm_kernel_config::testing::{embed, minimal_fdt, AreaBuilder, Payload, LINK_BASE};

const AREA_AT: usize = 0x6000;
const IMAGE_LEN: usize = 0x20000;

fn firmware_area(order: Endianness) -> AreaBuilder {
    AreaBuilder::new(order)
        .entry(TAG_VERSION_INFO, Payload::Version("07.57", "r112233", "7.57"))
        .entry(DEVICE_TREE_SUBREV_FIRST, Payload::DeviceTree(minimal_fdt(0)))
        .entry(DEVICE_TREE_SUBREV_FIRST + 1, Payload::DeviceTree(minimal_fdt(1)))
}

#[test]
fn test_analyze_both_orders() {
    for order in [Endianness::Little, Endianness::Big] {
        let image = embed(&firmware_area(order).build(), AREA_AT, IMAGE_LEN);
        let table = analyze(&image, None, &AnalysisConfig::default()).unwrap();
        assert_eq!(table.byte_order(), order);
        assert_eq!(table.local_base(), AREA_AT);
        assert_eq!(table.device_trees().count(), 2);
        assert_eq!(table.device_tree(1), Some(&minimal_fdt(1)[..]));
    }
}

#[test]
fn test_locate_then_extract() {
    let builder = firmware_area(Endianness::Big);
    let area = builder.build();
    let image = embed(&area, AREA_AT, IMAGE_LEN);
    let config = AnalysisConfig::default();

    let location = find_config_area(&image, None, &config).unwrap();
    assert_eq!(location.area_offset, AREA_AT);
    assert_eq!(location.dtb_offset, AREA_AT + builder.first_payload_offset() + 0xc0);
    assert_eq!(location.source, DtbSource::Signature);

    let dump = extract_config_area(&image, &location, &config.locator);
    assert_eq!(dump.len(), config.locator.area_size);
    assert_eq!(&dump[..area.len()], &area[..]);
}

#[test]
fn test_supplied_device_tree_selects_anchor() {
    let image = embed(&firmware_area(Endianness::Little).build(), AREA_AT, IMAGE_LEN);
    let dtb = minimal_fdt(1);
    let config = AnalysisConfig::default();

    let location = find_config_area(&image, Some(&dtb), &config).unwrap();
    assert_eq!(location.source, DtbSource::Supplied);
    assert_eq!(location.area_offset, AREA_AT);

    let table = analyze(&image, Some(&dtb), &config).unwrap();
    assert!(table.has_device_tree(1));

    let missing = minimal_fdt(9);
    assert!(matches!(
        analyze(&image, Some(&missing), &config),
        Err(ConfigAreaError::AreaNotFound { dtb_found: false })
    ));
}

#[test]
fn test_area_start_pages_before_device_tree() {
    let area = AreaBuilder::new(Endianness::Big)
        .size(0x4000)
        .entry(TAG_HW_CONFIG, Payload::Raw(vec![0u8; 0x2100]))
        .entry(DEVICE_TREE_SUBREV_FIRST, Payload::DeviceTree(minimal_fdt(0)))
        .build();
    let image = embed(&area, AREA_AT, IMAGE_LEN);

    let table = analyze(&image, None, &AnalysisConfig::default()).unwrap();
    assert_eq!(table.local_base(), AREA_AT);

    let config = AnalysisConfig::from_json(r#"{"locator": {"max_pages_back": 1}}"#).unwrap();
    assert!(matches!(
        analyze(&image, None, &config),
        Err(ConfigAreaError::AreaNotFound { dtb_found: true })
    ));
}

#[test]
fn test_summary_json() {
    let image = embed(&firmware_area(Endianness::Little).build(), AREA_AT, IMAGE_LEN);
    let table = analyze(&image, None, &AnalysisConfig::default()).unwrap();
    let summary = AreaSummary::from_table(&table);

    assert_eq!(summary.link_base, LINK_BASE);
    assert_eq!(summary.device_trees.len(), 2);
    assert_ne!(summary.device_trees[0].sha256, summary.device_trees[1].sha256);

    let json: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
    assert_eq!(json["byte_order"], "little");
    assert_eq!(json["version"]["source_revision"], "r112233");
    assert_eq!(json["device_trees"][1]["subrev"], 1);
    assert_eq!(json["device_trees"][1]["size"], 72);
}

#[test]
fn test_image_without_device_tree() {
    let image = vec![0u8; IMAGE_LEN];
    assert!(find_config_area(&image, None, &AnalysisConfig::default()).is_none());
    assert!(matches!(
        analyze(&image, None, &AnalysisConfig::default()),
        Err(ConfigAreaError::AreaNotFound { dtb_found: false })
    ));
}
