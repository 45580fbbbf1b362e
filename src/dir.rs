//! ## Directory walker
//!
//! Turns a starting cluster into a flat sequence of decoded directory
//! entries, following the file-FAT chain across cluster boundaries.
//! Directory records always live in file clusters (spec §4.5 rule 6), even
//! when they describe video-attribute entries.

use log::warn;

use crate::bpb::Geometry;
use crate::cluster::read_file_cluster;
use crate::device::BlockDevice;
use crate::dirent::{DirEntry, ENTRY_SIZE};
use crate::error::DYNERR;
use crate::fat::{file_next, Link};
use crate::lba::read_lba_run;

/// Read the full file FAT into memory once per directory walk. XTVFS keeps
/// two identical copies; the first is authoritative.
fn read_file_fat(dev: &mut dyn BlockDevice, geometry: &Geometry) -> Result<Vec<u8>, DYNERR> {
    read_lba_run(dev, geometry.file_fat_begin_lba, geometry.fat_size_sectors as u64)
}

/// List the entries of the directory rooted at `first_cluster`, skipping
/// deleted and LFN records and stopping at the first end-of-directory
/// sentinel or the end of the chain.
pub fn read_directory(
    dev: &mut dyn BlockDevice,
    geometry: &Geometry,
    first_cluster: u32,
) -> Result<Vec<DirEntry>, DYNERR> {
    let fat = read_file_fat(dev, geometry)?;
    let mut entries = Vec::new();
    let mut cluster = first_cluster;
    'clusters: loop {
        let data = read_file_cluster(dev, geometry, cluster)?;
        for record in data.chunks_exact(ENTRY_SIZE) {
            let record: &[u8; ENTRY_SIZE] = record.try_into().expect("chunks_exact width");
            let entry = DirEntry::decode(record, geometry.kind);
            if entry.is_end_of_directory() {
                break 'clusters;
            }
            if entry.is_deleted() || entry.is_long_file_name() {
                continue;
            }
            entries.push(entry);
        }
        match file_next(&fat, cluster) {
            Link::Next(next) => cluster = next,
            Link::End => {
                warn!(
                    "directory at cluster {} ran off its chain without an explicit terminator",
                    first_cluster
                );
                break 'clusters;
            }
            Link::Bad => {
                warn!("directory at cluster {} hit a bad-cluster marker", first_cluster);
                break 'clusters;
            }
            Link::Invalid => {
                warn!(
                    "directory at cluster {} referenced an out-of-range cluster",
                    first_cluster
                );
                break 'clusters;
            }
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bpb::decode_fat32_volume;
    use crate::device::MemoryDevice;
    use crate::lba::SECTOR_SIZE;

    fn base_image(total_sectors: u32) -> (Vec<u8>, Geometry) {
        let mut boot = vec![0u8; SECTOR_SIZE];
        boot[0x0B..0x0D].copy_from_slice(&512u16.to_le_bytes());
        boot[0x0D] = 8; // sectors per cluster
        boot[0x0E..0x10].copy_from_slice(&32u16.to_le_bytes());
        boot[0x10..0x12].copy_from_slice(&2u16.to_le_bytes());
        boot[0x20..0x24].copy_from_slice(&total_sectors.to_le_bytes());
        boot[0x24..0x28].copy_from_slice(&1u32.to_le_bytes());
        boot[0x2C..0x30].copy_from_slice(&2u32.to_le_bytes());
        boot[0x1FE] = 0x55;
        boot[0x1FF] = 0xAA;
        let geometry = decode_fat32_volume(&boot).unwrap();

        let mut image = vec![0u8; SECTOR_SIZE * total_sectors as usize];
        image[0..SECTOR_SIZE].copy_from_slice(&boot);
        (image, geometry)
    }

    fn fat_entry_offset(geometry: &Geometry, cluster: u32) -> usize {
        geometry.file_fat_begin_lba as usize * SECTOR_SIZE + cluster as usize * 4
    }

    fn cluster_offset(geometry: &Geometry, cluster: u32) -> usize {
        (geometry.cluster_area_begin_lba + (cluster - 2) as u64 * geometry.sectors_per_cluster as u64)
            as usize
            * SECTOR_SIZE
    }

    #[test]
    fn empty_root_cluster_yields_no_entries() {
        let (image, geometry) = base_image(1024);
        let mut dev = MemoryDevice::new(image);
        let entries = read_directory(&mut dev, &geometry, 2).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn one_entry_is_decoded_and_chain_follows_across_clusters() {
        let (mut image, geometry) = base_image(1024);
        let off = fat_entry_offset(&geometry, 2);
        image[off..off + 4].copy_from_slice(&0x0FFF_FFF8u32.to_le_bytes());

        let dir_off = cluster_offset(&geometry, 2);
        image[dir_off..dir_off + 11].copy_from_slice(b"HELLO   TXT");
        image[dir_off + 0x0B] = 0x20;
        image[dir_off + 0x1A..dir_off + 0x1C].copy_from_slice(&3u16.to_le_bytes());
        image[dir_off + 0x1C..dir_off + 0x20].copy_from_slice(&5u32.to_le_bytes());

        let mut dev = MemoryDevice::new(image);
        let entries = read_directory(&mut dev, &geometry, 2).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(&entries[0].name_raw, b"HELLO   TXT");
        assert_eq!(entries[0].first_cluster, 3);
        assert_eq!(entries[0].size, 5);
    }

    #[test]
    fn deleted_and_lfn_records_are_skipped() {
        let (mut image, geometry) = base_image(1024);
        let off = fat_entry_offset(&geometry, 2);
        image[off..off + 4].copy_from_slice(&0x0FFF_FFF8u32.to_le_bytes());
        let dir_off = cluster_offset(&geometry, 2);

        image[dir_off..dir_off + 11].copy_from_slice(b"DEL        ");
        image[dir_off] = 0xE5;

        image[dir_off + 32..dir_off + 32 + 11].copy_from_slice(b"LFN RECORD1");
        image[dir_off + 32 + 0x0B] = 0x0F;

        let mut dev = MemoryDevice::new(image);
        let entries = read_directory(&mut dev, &geometry, 2).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn missing_terminator_at_end_of_chain_still_returns_entries() {
        let (mut image, geometry) = base_image(1024);
        let off = fat_entry_offset(&geometry, 2);
        image[off..off + 4].copy_from_slice(&0x0FFF_FFF8u32.to_le_bytes());
        let dir_off = cluster_offset(&geometry, 2);
        image[dir_off..dir_off + 11].copy_from_slice(b"HELLO   TXT");
        image[dir_off + 0x0B] = 0x20;

        let mut dev = MemoryDevice::new(image);
        let entries = read_directory(&mut dev, &geometry, 2).unwrap();
        assert_eq!(entries.len(), 1);
    }
}
