//! ## Block device module
//!
//! Abstracts the byte source backing an XTVFS image so the decoder can run
//! against a real disk file or, in tests, an in-memory buffer. Nothing above
//! this module ever touches `std::fs` directly.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{Error, DYNERR, STDRESULT};

/// Random-access byte source. Implementations need not be `Send`/`Sync`; a
/// `Filesystem` holds exclusive ownership of one and is used single-threaded
/// (see the concurrency notes in the crate's top-level docs).
pub trait BlockDevice {
    /// Total length of the underlying image, in bytes.
    fn len(&self) -> u64;
    /// Read exactly `buf.len()` bytes starting at `offset`. A short read
    /// (including a read that runs past `len()`) fails with `Error::Io`.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> STDRESULT;
}

/// Backs an image with an open file.
pub struct FileDevice {
    file: std::fs::File,
    len: u64,
}

impl FileDevice {
    pub fn open(path: &std::path::Path) -> Result<Self, DYNERR> {
        let file = std::fs::File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self { file, len })
    }
}

impl BlockDevice for FileDevice {
    fn len(&self) -> u64 {
        self.len
    }
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> STDRESULT {
        if offset.saturating_add(buf.len() as u64) > self.len {
            return Err(Box::new(Error::Io));
        }
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)?;
        Ok(())
    }
}

/// Backs an image with an in-memory buffer. Used heavily by tests, which
/// build synthetic boot sectors, FATs, and clusters byte by byte.
pub struct MemoryDevice {
    data: Vec<u8>,
}

impl MemoryDevice {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl BlockDevice for MemoryDevice {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> STDRESULT {
        let start = offset as usize;
        let end = start + buf.len();
        if end > self.data.len() {
            return Err(Box::new(Error::Io));
        }
        buf.copy_from_slice(&self.data[start..end]);
        Ok(())
    }
}
