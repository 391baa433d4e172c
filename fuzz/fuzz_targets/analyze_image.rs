#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let config = avm_kernel_config::AnalysisConfig::default();
    let _ = avm_kernel_config::analyze(data, None, &config);
});
