//! Binary index file format.
//!
//! ```text
//! magic      b"TGIX"
//! version    u32 BE
//! count      u32 BE
//! entries    count x { len: u32 BE, bincode(IndexEntry) }
//! checksum   32-byte BLAKE3 of everything above
//! ```

use toygit_crypto::{checksum, CHECKSUM_LEN};

use crate::entry::{validate_path, IndexEntry};
use crate::error::{IndexError, IndexResult};
use crate::index::Index;

/// File signature.
pub const MAGIC: &[u8; 4] = b"TGIX";

const HEADER_LEN: usize = MAGIC.len() + 4 + 4;

/// Serialize `index` into its on-disk form.
pub fn encode(index: &Index) -> IndexResult<Vec<u8>> {
    let count = u32::try_from(index.len())
        .map_err(|_| IndexError::Serialization(format!("{} entries", index.len())))?;

    let mut out = Vec::with_capacity(HEADER_LEN + index.len() * 128 + CHECKSUM_LEN);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&Index::VERSION.to_be_bytes());
    out.extend_from_slice(&count.to_be_bytes());
    for entry in index.iter() {
        let record =
            bincode::serialize(entry).map_err(|e| IndexError::Serialization(e.to_string()))?;
        let len = u32::try_from(record.len())
            .map_err(|_| IndexError::Serialization(format!("entry {} too large", entry.path)))?;
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&record);
    }
    let sum = checksum(&out);
    out.extend_from_slice(&sum);
    Ok(out)
}

/// Parse and verify an on-disk index.
pub fn decode(bytes: &[u8]) -> IndexResult<Index> {
    if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(corrupt(format!("file is only {} bytes", bytes.len())));
    }
    let (body, trailer) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    if checksum(body) != trailer {
        return Err(corrupt("checksum mismatch"));
    }
    if &body[..MAGIC.len()] != MAGIC {
        return Err(corrupt("bad signature"));
    }

    let mut reader = Reader {
        bytes: body,
        pos: MAGIC.len(),
    };
    let version = reader.u32()?;
    if version != Index::VERSION {
        return Err(corrupt(format!("unsupported version {version}")));
    }
    let count = reader.u32()?;

    let mut index = Index::new();
    let mut previous: Option<String> = None;
    for n in 0..count {
        let len = reader.u32()? as usize;
        let record = reader.take(len)?;
        let entry: IndexEntry = bincode::deserialize(record)
            .map_err(|e| corrupt(format!("entry {n}: {e}")))?;
        if bincode::serialized_size(&entry).ok() != Some(len as u64) {
            return Err(corrupt(format!("entry {n} has trailing bytes")));
        }
        validate_path(&entry.path).map_err(|e| corrupt(e.to_string()))?;
        if previous.as_deref().is_some_and(|prev| prev >= entry.path.as_str()) {
            return Err(corrupt(format!("entry {:?} is out of order", entry.path)));
        }
        if has_tracked_ancestor(&index, &entry.path) {
            return Err(corrupt(format!(
                "entry {:?} is nested under a tracked file",
                entry.path
            )));
        }
        previous = Some(entry.path.clone());
        index.upsert(entry)?;
    }

    if reader.pos != body.len() {
        return Err(corrupt(format!(
            "{} unexpected bytes after the last entry",
            body.len() - reader.pos
        )));
    }
    Ok(index)
}

fn has_tracked_ancestor(index: &Index, path: &str) -> bool {
    path.match_indices('/').any(|(i, _)| index.contains(&path[..i]))
}

fn corrupt(reason: impl Into<String>) -> IndexError {
    IndexError::CorruptIndex(reason.into())
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> IndexResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| corrupt("truncated"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> IndexResult<u32> {
        let raw = self.take(4)?;
        Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{CacheStamp, FileTime};
    use proptest::prelude::*;
    use toygit_object::EntryMode;
    use toygit_types::ObjectId;

    fn entry(path: &str, n: u8) -> IndexEntry {
        IndexEntry {
            path: path.to_string(),
            object_id: ObjectId::from_hash([n; 32]),
            mode: if n % 2 == 0 {
                EntryMode::Regular
            } else {
                EntryMode::Executable
            },
            size: u64::from(n) * 10,
            mtime: FileTime::new(1_700_000_000 + i64::from(n), 5),
            stamp: CacheStamp {
                ctime: FileTime::new(1_700_000_000, 7),
                dev: 1,
                ino: u64::from(n),
                uid: 1000,
                gid: 1000,
            },
        }
    }

    fn sample() -> Index {
        let mut index = Index::new();
        for (n, path) in ["src/main.rs", "README.md", "src/lib/mod.rs"].iter().enumerate() {
            index.upsert(entry(path, n as u8)).unwrap();
        }
        index
    }

    #[test]
    fn layout_header() {
        let bytes = encode(&sample()).unwrap();
        assert_eq!(&bytes[..4], b"TGIX");
        assert_eq!(&bytes[4..8], &1u32.to_be_bytes());
        assert_eq!(&bytes[8..12], &3u32.to_be_bytes());
        let (body, sum) = bytes.split_at(bytes.len() - 32);
        assert_eq!(checksum(body), sum);
    }

    #[test]
    fn roundtrip() {
        let index = sample();
        assert_eq!(decode(&encode(&index).unwrap()).unwrap(), index);
    }

    #[test]
    fn empty_index_roundtrip() {
        let bytes = encode(&Index::new()).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + CHECKSUM_LEN);
        assert!(decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn every_flipped_byte_is_detected() {
        let bytes = encode(&sample()).unwrap();
        for i in 0..bytes.len() {
            let mut tampered = bytes.clone();
            tampered[i] ^= 0x40;
            assert!(
                matches!(decode(&tampered), Err(IndexError::CorruptIndex(_))),
                "byte {i}"
            );
        }
    }

    #[test]
    fn truncated_file_is_corrupt() {
        let bytes = encode(&sample()).unwrap();
        for len in [0, 10, bytes.len() - 1] {
            assert!(matches!(
                decode(&bytes[..len]),
                Err(IndexError::CorruptIndex(_))
            ));
        }
    }

    /// Re-seal a hand-built body with a valid checksum.
    fn seal(mut body: Vec<u8>) -> Vec<u8> {
        let sum = checksum(&body);
        body.extend_from_slice(&sum);
        body
    }

    fn body_with(version: u32, entries: &[IndexEntry]) -> Vec<u8> {
        let mut body = MAGIC.to_vec();
        body.extend_from_slice(&version.to_be_bytes());
        body.extend_from_slice(&(entries.len() as u32).to_be_bytes());
        for e in entries {
            let record = bincode::serialize(e).unwrap();
            body.extend_from_slice(&(record.len() as u32).to_be_bytes());
            body.extend_from_slice(&record);
        }
        body
    }

    #[test]
    fn unsupported_version_is_corrupt() {
        let err = decode(&seal(body_with(2, &[]))).unwrap_err();
        assert!(err.to_string().contains("unsupported version 2"));
    }

    #[test]
    fn unsorted_entries_are_corrupt() {
        let bytes = seal(body_with(1, &[entry("b", 1), entry("a", 2)]));
        let err = decode(&bytes).unwrap_err();
        assert!(err.to_string().contains("out of order"), "{err}");
    }

    #[test]
    fn duplicate_entries_are_corrupt() {
        let bytes = seal(body_with(1, &[entry("a", 1), entry("a", 2)]));
        assert!(matches!(decode(&bytes), Err(IndexError::CorruptIndex(_))));
    }

    #[test]
    fn nested_under_file_is_corrupt() {
        let bytes = seal(body_with(1, &[entry("a", 1), entry("a/b", 2)]));
        assert!(matches!(decode(&bytes), Err(IndexError::CorruptIndex(_))));
    }

    #[test]
    fn invalid_path_is_corrupt() {
        let bytes = seal(body_with(1, &[entry("../escape", 1)]));
        assert!(matches!(decode(&bytes), Err(IndexError::CorruptIndex(_))));
    }

    #[test]
    fn trailing_bytes_are_corrupt() {
        let mut body = body_with(1, &[entry("a", 1)]);
        body.push(0);
        let err = decode(&seal(body)).unwrap_err();
        assert!(err.to_string().contains("unexpected bytes"), "{err}");
    }

    proptest! {
        #[test]
        fn save_load_sorts_regardless_of_insertion(
            paths in proptest::collection::btree_set("[a-z]{1,4}(/[a-z]{1,4}){0,2}", 1..16),
            reverse in any::<bool>(),
        ) {
            let mut paths: Vec<String> = paths.into_iter().collect();
            if reverse {
                paths.reverse();
            }
            let mut index = Index::new();
            for (n, path) in paths.iter().enumerate() {
                index.upsert(entry(path, n as u8)).unwrap();
            }
            let loaded = decode(&encode(&index).unwrap()).unwrap();
            let loaded_paths: Vec<&str> = loaded.iter().map(|e| e.path.as_str()).collect();
            let mut sorted = loaded_paths.clone();
            sorted.sort_unstable();
            prop_assert_eq!(&loaded_paths, &sorted);
            prop_assert_eq!(loaded, index);
        }
    }
}
