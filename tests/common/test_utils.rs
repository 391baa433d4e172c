//! Shared helpers for temporary files.

use avm_kernel_config::config::IOConfig;
use avm_kernel_config::io::KernelImage;
use std::io::Write;
use tempfile::NamedTempFile;

/// Creates a temporary file with the given content.
///
/// The file is removed when the returned `NamedTempFile` is dropped.
pub fn create_temp_file(content: &[u8]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content).unwrap();
    temp_file
}

/// Maps a temporary file with the default I/O configuration.
pub fn open_image(file: &NamedTempFile) -> KernelImage {
    KernelImage::open(file.path(), &IOConfig::default()).unwrap()
}
