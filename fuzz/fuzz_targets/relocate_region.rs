#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(table) = avm_kernel_config::relocate(data, 0, data.len()) {
        let _ = avm_kernel_config::AreaSummary::from_table(&table);
    }
});
