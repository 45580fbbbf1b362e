//! Read-only decoder for XTVFS, a FAT32 superset used by Sky+ style PVR
//! set-top boxes.
//!
//! XTVFS follows FAT32 conventions for directory structure, metadata, and
//! small files; long `.STR` recordings live in a second, parallel
//! allocation universe with its own FAT ("the video FAT"), larger
//! clusters, and a data region derived from a percentage of the volume.
//! This crate only reads images — there is no write, format, defragment,
//! or deleted-entry recovery support, and Long File Name records are
//! recognized and skipped rather than assembled.
//!
//! A [`Filesystem`] owns a [`BlockDevice`] and the geometry decoded from
//! its boot sector. `open` tries the XTVFS marker first and falls back to
//! plain FAT32; the same handle and the same four operations —
//! [`Filesystem::read_directory`], [`Filesystem::stat`],
//! [`Filesystem::read_file`], [`Filesystem::allocation_chain`] — serve
//! both variants, dispatching on the stored [`bpb::Kind`] and each entry's
//! `Device` attribute bit.

pub mod bpb;
pub mod cluster;
pub mod copy;
pub mod device;
pub mod dir;
pub mod dirent;
pub mod error;
pub mod fat;
pub mod lba;
pub mod mbr;
pub mod path;

pub use bpb::{Geometry, Kind};
pub use copy::Sink;
pub use device::{BlockDevice, FileDevice, MemoryDevice};
pub use dirent::DirEntry;
pub use error::{Error, DYNERR, STDRESULT};

use log::debug;

/// A single open XTVFS or FAT32 volume.
pub struct Filesystem<D: BlockDevice> {
    device: D,
    geometry: Geometry,
}

impl<D: BlockDevice> Filesystem<D> {
    /// Decode the boot sector, FSInfo sector, and (if present) the XTVFS
    /// marker at LBA 2. Tries XTVFS first; any failure there degrades to
    /// plain FAT32 rather than failing `open`.
    pub fn open(mut device: D) -> Result<Self, DYNERR> {
        let boot = lba::read_lba(&mut device, 0)?;
        let mut geometry = bpb::decode_fat32_volume(&boot)?;

        if let Ok(fsinfo_block) = lba::read_lba(&mut device, 1) {
            if let Some(info) = bpb::decode_fsinfo(&fsinfo_block) {
                debug!(
                    "FSInfo: {} free clusters, last allocated {}",
                    info.free_count, info.next_free
                );
            }
        }

        if let Ok(marker_block) = lba::read_lba(&mut device, 2) {
            if bpb::decode_xtvfs(&marker_block, &mut geometry) {
                debug!("volume recognized as XTVFS");
            }
        }

        Ok(Self { device, geometry })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// List a directory's entries. `cluster` defaults to the root
    /// directory's first cluster when `None`.
    pub fn read_directory(&mut self, cluster: Option<u32>) -> Result<Vec<DirEntry>, DYNERR> {
        let start = cluster.unwrap_or(self.geometry.root_first_cluster);
        dir::read_directory(&mut self.device, &self.geometry, start)
    }

    /// Resolve a `/`- or `\`-separated path to its directory entry.
    pub fn stat(&mut self, path: &str) -> Result<DirEntry, DYNERR> {
        path::stat(&mut self.device, &self.geometry, path)
    }

    /// Stream a path's full contents into `sink`.
    pub fn read_file(&mut self, path: &str, sink: &mut dyn Sink) -> STDRESULT {
        let entry = self.stat(path)?;
        copy::read_file(&mut self.device, &self.geometry, &entry, sink)
    }

    /// Diagnostic: the list of clusters backing a path, without reading
    /// their contents.
    pub fn allocation_chain(&mut self, path: &str) -> Result<Vec<u32>, DYNERR> {
        copy::allocation_chain(&mut self.device, &self.geometry, path)
    }

    /// Diagnostic: verify a video file's chain neither loops nor runs
    /// longer than its recorded size implies.
    pub fn verify_video_chain(&mut self, first_cluster: u32, size: u64) -> STDRESULT {
        copy::verify_video_chain(&mut self.device, &self.geometry, first_cluster, size)
    }
}
