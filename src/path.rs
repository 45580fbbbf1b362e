//! ## Path resolver
//!
//! Converts human path strings to and from the on-disk 11-byte 8.3 form,
//! and walks directories from the root cluster to resolve a path to its
//! directory entry.

use crate::bpb::Geometry;
use crate::device::BlockDevice;
use crate::dir::read_directory;
use crate::dirent::DirEntry;
use crate::error::{Error, DYNERR};

/// Convert a human filename to the opaque 11-byte on-disk form. Characters
/// before the first `.` fill bytes 0..8 (right-padded with spaces,
/// truncated at 8); characters after fill bytes 8..11 the same way. A name
/// with no `.` fills only 0..8, leaving the extension blank. Always
/// uppercased.
pub fn to_11char(name: &str) -> [u8; 11] {
    let upper = name.to_ascii_uppercase();
    let (base, ext) = match upper.split_once('.') {
        Some((b, e)) => (b, e),
        None => (upper.as_str(), ""),
    };
    let mut raw = [b' '; 11];
    for (i, b) in base.bytes().take(8).enumerate() {
        raw[i] = b;
    }
    for (i, b) in ext.bytes().take(3).enumerate() {
        raw[8 + i] = b;
    }
    raw
}

/// Inverse of `to_11char`, for display only: trims trailing spaces from
/// each half, joins with `.` when the extension half is non-empty, and
/// lowercases.
pub fn from_11char(raw: &[u8; 11]) -> String {
    let base = std::str::from_utf8(&raw[0..8]).unwrap_or("").trim_end();
    let ext = std::str::from_utf8(&raw[8..11]).unwrap_or("").trim_end();
    let joined = if ext.is_empty() {
        base.to_string()
    } else {
        format!("{}.{}", base, ext)
    };
    joined.to_ascii_lowercase()
}

/// Resolve `path` to its directory entry, starting at
/// `geometry.root_first_cluster`. Components are separated by `/` or `\`;
/// empty components (leading/trailing separators) are ignored.
pub fn stat(
    dev: &mut dyn BlockDevice,
    geometry: &Geometry,
    path: &str,
) -> Result<DirEntry, DYNERR> {
    let components: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|c| !c.is_empty())
        .collect();
    if components.is_empty() {
        return Err(Box::new(Error::NotFound));
    }

    let mut cluster = geometry.root_first_cluster;
    let last = components.len() - 1;
    for (i, component) in components.iter().enumerate() {
        let target = to_11char(component);
        let entries = read_directory(dev, geometry, cluster)?;
        let found = entries.into_iter().find(|e| e.name_raw == target);
        match found {
            None => return Err(Box::new(Error::NotFound)),
            Some(entry) => {
                if i == last {
                    return Ok(entry);
                }
                if !entry.is_directory() {
                    return Err(Box::new(Error::NotFound));
                }
                cluster = entry.first_cluster;
            }
        }
    }
    unreachable!("loop always returns on the last component")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_base_and_extension() {
        assert_eq!(&to_11char("hello.txt"), b"HELLO   TXT");
        assert_eq!(&to_11char("a.b"), b"A       B  ");
        assert_eq!(&to_11char("noext"), b"NOEXT      ");
        assert_eq!(&to_11char("toolongname.abcd"), b"TOOLONGNABC");
    }

    #[test]
    fn round_trips_through_lowercase() {
        let raw = to_11char("hello.txt");
        assert_eq!(from_11char(&raw), "hello.txt");
        let raw2 = to_11char("noext");
        assert_eq!(from_11char(&raw2), "noext");
    }
}
