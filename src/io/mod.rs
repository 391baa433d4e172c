//! Read-only, memory-mapped access to kernel images and area dumps.
//!
//! The analysis core works on plain byte slices; this module only produces
//! them. Files are mapped read-only and never written.

pub mod error;

use crate::config::IOConfig;
use crate::io::error::{IoError, Result};
use bytes::Bytes;
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A memory-mapped input file.
#[derive(Debug)]
pub struct KernelImage {
    path: PathBuf,
    // None when the file size is zero; memmap cannot map empty files.
    mmap: Option<Mmap>,
    file_size: u64,
}

impl KernelImage {
    /// Opens and maps a file, failing if it exceeds `limits.max_file_size`.
    pub fn open<P: AsRef<Path>>(path: P, limits: &IOConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        debug!(
            path = %path.display(),
            size = file_size,
            limits.max_file_size = limits.max_file_size,
            "Opening image"
        );

        if file_size > limits.max_file_size {
            warn!(
                path = %path.display(),
                size = file_size,
                limit = limits.max_file_size,
                "File is too large"
            );
            return Err(IoError::FileTooLarge {
                limit: limits.max_file_size,
                found: file_size,
            });
        }

        let mmap = if file_size == 0 {
            None
        } else {
            // Safety: the map is read-only and the file is not modified by
            // this process while mapped.
            Some(unsafe { Mmap::map(&file)? })
        };

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            file_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the total size of the underlying file in bytes.
    pub fn size(&self) -> u64 {
        self.file_size
    }

    /// The whole file contents.
    pub fn as_bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    /// Copy of up to `len` bytes at `offset`; shorter (or empty) past EOF.
    pub fn read_at(&self, offset: usize, len: usize) -> Bytes {
        let data = self.as_bytes();
        if offset >= data.len() {
            return Bytes::new();
        }
        let end = offset.saturating_add(len).min(data.len());
        Bytes::copy_from_slice(&data[offset..end])
    }
}

impl AsRef<[u8]> for KernelImage {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
