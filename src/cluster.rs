//! ## Cluster reader
//!
//! Converts a cluster number into an LBA and reads it, for whichever of the
//! two cluster universes a caller is walking. Cluster numbers below 2 are
//! never valid starts of a chain on either universe.

use crate::bpb::Geometry;
use crate::device::BlockDevice;
use crate::error::{Error, DYNERR};
use crate::lba::read_lba_run;

fn check_cluster(c: u32) -> Result<u64, DYNERR> {
    if c < 2 {
        return Err(Box::new(Error::Corrupt));
    }
    Ok((c - 2) as u64)
}

/// Read one cluster's worth of bytes from the normal FAT32 cluster region.
pub fn read_file_cluster(
    dev: &mut dyn BlockDevice,
    geometry: &Geometry,
    cluster: u32,
) -> Result<Vec<u8>, DYNERR> {
    let index = check_cluster(cluster)?;
    let lba = geometry.cluster_area_begin_lba + index * geometry.sectors_per_cluster as u64;
    read_lba_run(dev, lba, geometry.sectors_per_cluster as u64)
}

/// Read one cluster's worth of bytes from the video-data region. Requires
/// `geometry.video_data_begin_lba` to be set, i.e. `geometry.kind ==
/// Kind::Xtvfs`.
pub fn read_video_cluster(
    dev: &mut dyn BlockDevice,
    geometry: &Geometry,
    cluster: u32,
) -> Result<Vec<u8>, DYNERR> {
    let index = check_cluster(cluster)?;
    let video_data_begin_lba = geometry
        .video_data_begin_lba
        .ok_or_else(|| Box::new(Error::BadVolume) as DYNERR)?;
    let lba = video_data_begin_lba + index * geometry.video_sectors_per_cluster;
    read_lba_run(dev, lba, geometry.video_sectors_per_cluster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bpb::decode_fat32_volume;
    use crate::device::MemoryDevice;
    use crate::lba::SECTOR_SIZE;

    fn geometry() -> Geometry {
        let mut b = vec![0u8; SECTOR_SIZE];
        b[0x0B..0x0D].copy_from_slice(&512u16.to_le_bytes());
        b[0x0D] = 1; // 1 sector per cluster
        b[0x0E..0x10].copy_from_slice(&2u16.to_le_bytes()); // reserved
        b[0x10..0x12].copy_from_slice(&2u16.to_le_bytes()); // num fats
        b[0x20..0x24].copy_from_slice(&64u32.to_le_bytes());
        b[0x24..0x28].copy_from_slice(&1u32.to_le_bytes()); // fat size
        b[0x2C..0x30].copy_from_slice(&2u32.to_le_bytes());
        b[0x1FE] = 0x55;
        b[0x1FF] = 0xAA;
        decode_fat32_volume(&b).unwrap()
    }

    #[test]
    fn file_cluster_2_starts_at_cluster_area_begin() {
        let g = geometry();
        let mut data = vec![0u8; SECTOR_SIZE * 8];
        data[g.cluster_area_begin_lba as usize * SECTOR_SIZE] = 0x7A;
        let mut dev = MemoryDevice::new(data);
        let buf = read_file_cluster(&mut dev, &g, 2).unwrap();
        assert_eq!(buf[0], 0x7A);
    }

    #[test]
    fn cluster_below_2_is_corrupt() {
        let g = geometry();
        let mut dev = MemoryDevice::new(vec![0u8; SECTOR_SIZE * 8]);
        assert!(read_file_cluster(&mut dev, &g, 0).is_err());
        assert!(read_file_cluster(&mut dev, &g, 1).is_err());
    }

    #[test]
    fn video_cluster_requires_xtvfs_geometry() {
        let g = geometry();
        let mut dev = MemoryDevice::new(vec![0u8; SECTOR_SIZE * 8]);
        assert!(read_video_cluster(&mut dev, &g, 2).is_err());
    }
}
