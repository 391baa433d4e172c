//! Relocation of areas embedded in larger buffers.

use avm_kernel_config::layout::tags::{
    DEVICE_TREE_SUBREV_FIRST, TAG_AVMNET, TAG_MODULE_MEMORY, TAG_VERSION_INFO,
};
use avm_kernel_config::table::relocate_with_config;
use avm_kernel_config::config::DetectionConfig;
use avm_kernel_config::{relocate, ConfigEntry, ConfigTag, Endianness, RelocationFailure};

use avm_kernel_config::testing::{
    embed, minimal_fdt, AreaBuilder, Payload, ENTRIES_OFFSET, LINK_BASE,
};

const AREA_AT: usize = 0x5000;

fn full_area(order: Endianness) -> Vec<u8> {
    AreaBuilder::new(order)
        .entry(
            TAG_MODULE_MEMORY,
            Payload::ModuleMemory(vec![("avm_pa", 0x8000), ("wlan", 0x30000), ("isdn", 0x100)]),
        )
        .entry(TAG_VERSION_INFO, Payload::Version("113", "r98765", "FRITZ!Box 7590"))
        .entry(DEVICE_TREE_SUBREV_FIRST, Payload::DeviceTree(minimal_fdt(0)))
        .entry(DEVICE_TREE_SUBREV_FIRST + 3, Payload::DeviceTree(minimal_fdt(3)))
        .entry(TAG_AVMNET, Payload::Raw(vec![0xde, 0xad, 0xbe, 0xef]))
        .build()
}

#[test]
fn test_relocates_embedded_area() {
    for order in [Endianness::Little, Endianness::Big] {
        let area = full_area(order);
        let image = embed(&area, AREA_AT, 0x10000);
        let table = relocate(&image, AREA_AT, area.len()).unwrap();

        assert_eq!(table.byte_order(), order);
        assert_eq!(table.link_base(), LINK_BASE);
        assert_eq!(table.local_base(), AREA_AT);
        assert_eq!(table.region_size(), area.len());
        assert_eq!(table.entries_offset(), AREA_AT + ENTRIES_OFFSET);
        assert_eq!(table.len(), 5);

        let modules = table.module_memory().unwrap();
        let names: Vec<_> = modules.iter().map(|m| m.name_str().into_owned()).collect();
        assert_eq!(names, ["avm_pa", "wlan", "isdn"]);
        assert_eq!(modules[1].size, 0x30000);

        let version = table.version_info().unwrap();
        assert_eq!(version.build_number_str(), "113");
        assert_eq!(version.source_revision_str(), "r98765");
        assert_eq!(version.firmware_string_str(), "FRITZ!Box 7590");

        assert!(table.has_device_tree(0));
        assert!(table.has_device_tree(3));
        assert!(!table.has_device_tree(1));
        assert_eq!(table.device_tree(3), Some(&minimal_fdt(3)[..]));

        let tags: Vec<ConfigTag> = table.iter().map(ConfigEntry::tag).collect();
        assert_eq!(
            tags,
            [
                ConfigTag::ModuleMemory,
                ConfigTag::VersionInfo,
                ConfigTag::DeviceTree(0),
                ConfigTag::DeviceTree(3),
                ConfigTag::AvmNet,
            ]
        );
    }
}

#[test]
fn test_relocation_leaves_input_untouched() {
    let area = full_area(Endianness::Big);
    let image = embed(&area, AREA_AT, 0x10000);
    let before = image.clone();
    let first = relocate(&image, AREA_AT, area.len()).unwrap();
    let second = relocate(&image, AREA_AT, area.len()).unwrap();
    assert_eq!(first, second);
    assert_eq!(image, before);
}

#[test]
fn test_device_tree_blobs_point_into_the_buffer() {
    let area = full_area(Endianness::Little);
    let image = embed(&area, AREA_AT, 0x10000);
    let table = relocate(&image, AREA_AT, area.len()).unwrap();

    for entry in &table {
        if let ConfigEntry::DeviceTree { offset, blob, .. } = entry {
            assert!(*offset >= AREA_AT && *offset < AREA_AT + area.len());
            assert_eq!(&image[*offset..*offset + blob.len()], *blob);
        }
    }
}

#[test]
fn test_region_outside_buffer() {
    let area = full_area(Endianness::Little);
    let image = embed(&area, AREA_AT, 0x10000);
    assert_eq!(
        relocate(&image, 0xf000, 0x2000),
        Err(RelocationFailure::RegionOutOfBounds {
            offset: 0xf000,
            size: 0x2000,
            buffer_len: 0x10000,
        })
    );
}

#[test]
fn test_wrong_offset_is_not_a_table() {
    let area = full_area(Endianness::Little);
    let image = embed(&area, AREA_AT, 0x10000);
    assert!(matches!(
        relocate(&image, AREA_AT - 0x1000, area.len()),
        Err(RelocationFailure::NotAConfigTable(_))
    ));
}

#[test]
fn test_custom_horizon() {
    let area = full_area(Endianness::Big);
    let config = DetectionConfig { scan_horizon: 8 };
    assert!(matches!(
        relocate_with_config(&area, 0, area.len(), &config),
        Err(RelocationFailure::NotAConfigTable(_))
    ));
}
