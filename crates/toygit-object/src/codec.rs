//! Canonical encoding: `"<kind> <len>\0<payload>"`.
//!
//! Hashing and storage always operate on exactly these bytes. [`decode`]
//! accepts only what [`encode`] produces, so `encode(decode(b)) == b` holds
//! for every accepted `b`.

use toygit_crypto::ContentHasher;
use toygit_types::{ObjectId, ObjectKind};

use crate::commit::Commit;
use crate::error::ParseError;
use crate::object::{Blob, Object};
use crate::tag::Tag;
use crate::tree::Tree;

/// Longest header we search for the NUL terminator
/// (`"commit 18446744073709551615\0"` fits with room to spare).
const MAX_HEADER_LEN: usize = 32;

/// A parsed canonical header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub kind: ObjectKind,
    /// Declared payload length.
    pub len: usize,
    /// Bytes taken by the header, including the NUL.
    pub header_len: usize,
}

/// Identifier of the object whose payload is `payload`.
pub fn identify(kind: ObjectKind, payload: &[u8]) -> ObjectId {
    ContentHasher::new(kind).hash(payload)
}

/// Canonical bytes of `object`.
pub fn encode(object: &Object) -> Vec<u8> {
    let payload = object.payload();
    let mut out = ContentHasher::new(object.kind()).header(payload.len());
    out.extend_from_slice(&payload);
    out
}

/// Parse the `<kind> <len>\0` prefix without looking at the payload.
pub fn parse_header(bytes: &[u8]) -> Result<Header, ParseError> {
    let nul = bytes
        .iter()
        .take(MAX_HEADER_LEN)
        .position(|&b| b == 0)
        .ok_or_else(|| ParseError::MalformedHeader("missing NUL terminator".into()))?;
    let header = &bytes[..nul];

    let space = header
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| ParseError::MalformedHeader("missing space after kind".into()))?;
    let (raw_kind, raw_len) = (&header[..space], &header[space + 1..]);

    let kind = ObjectKind::from_bytes(raw_kind).ok_or_else(|| {
        ParseError::MalformedHeader(format!(
            "unknown kind {:?}",
            String::from_utf8_lossy(raw_kind)
        ))
    })?;

    let canonical_len = !raw_len.is_empty()
        && raw_len.iter().all(u8::is_ascii_digit)
        && (raw_len == b"0" || raw_len[0] != b'0');
    let len = std::str::from_utf8(raw_len)
        .ok()
        .filter(|_| canonical_len)
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| {
            ParseError::MalformedHeader(format!(
                "invalid length {:?}",
                String::from_utf8_lossy(raw_len)
            ))
        })?;

    Ok(Header {
        kind,
        len,
        header_len: nul + 1,
    })
}

/// Decode canonical bytes into an object.
pub fn decode(bytes: &[u8]) -> Result<Object, ParseError> {
    let header = parse_header(bytes)?;
    let payload = &bytes[header.header_len..];
    if payload.len() != header.len {
        return Err(ParseError::MalformedHeader(format!(
            "declared length {} but {} payload bytes follow",
            header.len,
            payload.len()
        )));
    }
    decode_payload(header.kind, payload)
}

/// Decode a payload whose kind is already known.
pub fn decode_payload(kind: ObjectKind, payload: &[u8]) -> Result<Object, ParseError> {
    let object = match kind {
        ObjectKind::Blob => Object::Blob(Blob::new(payload.to_vec())),
        ObjectKind::Tree => Object::Tree(Tree::parse_payload(payload)?),
        ObjectKind::Commit => Object::Commit(Commit::parse_payload(payload)?),
        ObjectKind::Tag => Object::Tag(Tag::parse_payload(payload)?),
    };
    if object.payload().as_ref() != payload {
        return Err(ParseError::body(kind, "payload is not in canonical form"));
    }
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::EntryMode;
    use crate::object::{blob_from_bytes, commit_from_fields, tag_from_fields, tree_from_entries};
    use crate::signature::Signature;
    use crate::tree::TreeEntry;
    use proptest::prelude::*;

    #[test]
    fn blob_encoding() {
        assert_eq!(encode(&blob_from_bytes("hi\n")), b"blob 3\0hi\n".to_vec());
        assert_eq!(encode(&blob_from_bytes("")), b"blob 0\0".to_vec());
    }

    #[test]
    fn identify_matches_object_id() {
        let blob = blob_from_bytes("hi\n");
        assert_eq!(identify(ObjectKind::Blob, b"hi\n"), blob.id());
        assert_eq!(
            blob.id(),
            ContentHasher::hash_canonical(&encode(&blob))
        );
    }

    #[test]
    fn decode_blob() {
        let obj = decode(b"blob 5\0hello").unwrap();
        assert_eq!(obj, blob_from_bytes("hello"));
    }

    #[test]
    fn parse_header_fields() {
        let header = parse_header(b"tree 12\0rest").unwrap();
        assert_eq!(
            header,
            Header {
                kind: ObjectKind::Tree,
                len: 12,
                header_len: 8
            }
        );
    }

    #[test]
    fn malformed_headers() {
        let cases: [&[u8]; 9] = [
            b"blob 5hello",
            b"blob5\0hello",
            b"blub 5\0hello",
            b"blob -5\0hello",
            b"blob 05\0hello",
            b"blob \0",
            b"blob 4\0hello",
            b"blob 6\0hello",
            b"",
        ];
        for bytes in cases {
            let err = decode(bytes).unwrap_err();
            assert!(
                matches!(err, ParseError::MalformedHeader(_)),
                "{:?} -> {err:?}",
                String::from_utf8_lossy(bytes)
            );
        }
    }

    #[test]
    fn invalid_tree_body() {
        let err = decode(b"tree 3\0abc").unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidBody {
                kind: ObjectKind::Tree,
                ..
            }
        ));
    }

    #[test]
    fn commit_without_tree_is_invalid_body() {
        let payload = b"author A <a@x> 0 +0000\ncommitter A <a@x> 0 +0000\n\nm";
        let mut bytes = format!("commit {}\0", payload.len()).into_bytes();
        bytes.extend_from_slice(payload);
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            ParseError::InvalidBody {
                kind: ObjectKind::Commit,
                ..
            }
        ));
    }

    #[test]
    fn non_canonical_directory_mode_rejected() {
        let mut payload = b"040000 d\0".to_vec();
        payload.extend_from_slice(&[1; 32]);
        let mut bytes = format!("tree {}\0", payload.len()).into_bytes();
        bytes.extend_from_slice(&payload);
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            ParseError::InvalidBody { .. }
        ));
    }

    #[test]
    fn every_kind_roundtrips_exactly() {
        let sig = Signature::new("Round Trip", "rt@example.com", 99, 60).unwrap();
        let blob = blob_from_bytes(vec![0u8, 1, 2, 255]);
        let tree = tree_from_entries(vec![
            TreeEntry::new(EntryMode::Regular, "a", blob.id()),
            TreeEntry::new(EntryMode::Directory, "sub", ObjectId::from_hash([3; 32])),
        ])
        .unwrap();
        let commit = commit_from_fields(tree.id(), vec![], sig.clone(), sig.clone(), "m").unwrap();
        let tag = tag_from_fields(commit.id(), ObjectKind::Commit, "v0", sig, "t\n").unwrap();

        for object in [blob, tree, commit, tag] {
            let bytes = encode(&object);
            let decoded = decode(&bytes).unwrap();
            assert_eq!(decoded, object);
            assert_eq!(encode(&decoded), bytes);
        }
    }

    fn signature_strategy() -> impl Strategy<Value = Signature> {
        (
            "[A-Za-z][A-Za-z .'-]{0,15}",
            "[a-z0-9.]{1,10}@[a-z]{1,8}\\.[a-z]{2,3}",
            any::<i64>(),
            -5999i16..=5999,
        )
            .prop_map(|(name, email, ts, tz)| Signature::new(name, email, ts, tz).unwrap())
    }

    fn id_strategy() -> impl Strategy<Value = ObjectId> {
        proptest::array::uniform32(any::<u8>()).prop_map(ObjectId::from_hash)
    }

    fn mode_strategy() -> impl Strategy<Value = EntryMode> {
        prop_oneof![
            Just(EntryMode::Regular),
            Just(EntryMode::Executable),
            Just(EntryMode::Symlink),
            Just(EntryMode::Directory),
        ]
    }

    fn object_strategy() -> impl Strategy<Value = Object> {
        let blob = proptest::collection::vec(any::<u8>(), 0..256).prop_map(blob_from_bytes);
        let tree = proptest::collection::btree_map(
            "[A-Za-z0-9_-][A-Za-z0-9._-]{0,11}",
            (mode_strategy(), id_strategy()),
            0..8,
        )
        .prop_map(|entries| {
            let entries = entries
                .into_iter()
                .map(|(name, (mode, id))| TreeEntry::new(mode, name, id))
                .collect();
            tree_from_entries(entries).unwrap()
        });
        let commit = (
            id_strategy(),
            proptest::collection::vec(id_strategy(), 0..3),
            signature_strategy(),
            signature_strategy(),
            "[ -~\n]{0,64}",
        )
            .prop_map(|(tree, parents, author, committer, message)| {
                commit_from_fields(
                    ObjectId::from_hash({
                        let mut raw = *tree.as_bytes();
                        raw[0] |= 1;
                        raw
                    }),
                    parents,
                    author,
                    committer,
                    message,
                )
                .unwrap()
            });
        let tag = (
            id_strategy(),
            prop_oneof![
                Just(ObjectKind::Blob),
                Just(ObjectKind::Tree),
                Just(ObjectKind::Commit),
                Just(ObjectKind::Tag),
            ],
            "[A-Za-z0-9._/-]{1,16}",
            signature_strategy(),
            "[ -~\n]{0,64}",
        )
            .prop_map(|(target, kind, name, tagger, message)| {
                tag_from_fields(target, kind, name, tagger, message).unwrap()
            });
        prop_oneof![blob, tree, commit, tag]
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(object in object_strategy()) {
            let bytes = encode(&object);
            prop_assert_eq!(decode(&bytes).unwrap(), object);
        }

        #[test]
        fn encode_inverts_decode(object in object_strategy()) {
            let bytes = encode(&object);
            let decoded = decode(&bytes).unwrap();
            prop_assert_eq!(encode(&decoded), bytes);
        }

        #[test]
        fn identify_is_deterministic(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(
                identify(ObjectKind::Blob, &payload),
                identify(ObjectKind::Blob, &payload.clone())
            );
        }

        #[test]
        fn distinct_inputs_give_distinct_ids(
            a in proptest::collection::vec(any::<u8>(), 0..128),
            b in proptest::collection::vec(any::<u8>(), 0..128),
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(identify(ObjectKind::Blob, &a), identify(ObjectKind::Blob, &b));
            prop_assert_ne!(identify(ObjectKind::Blob, &a), identify(ObjectKind::Tree, &a));
        }

        #[test]
        fn tree_order_is_insertion_independent(
            names in proptest::collection::btree_set("[a-z.]{1,6}", 1..10),
        ) {
            let names: Vec<String> = names
                .into_iter()
                .filter(|n| n != "." && n != "..")
                .collect();
            let entries: Vec<TreeEntry> = names
                .iter()
                .enumerate()
                .map(|(i, n)| {
                    let mode = if i % 2 == 0 { EntryMode::Regular } else { EntryMode::Directory };
                    TreeEntry::new(mode, n.clone(), ObjectId::from_hash([i as u8; 32]))
                })
                .collect();
            let mut reversed = entries.clone();
            reversed.reverse();
            let forward = tree_from_entries(entries).unwrap();
            let backward = tree_from_entries(reversed).unwrap();
            prop_assert_eq!(encode(&forward), encode(&backward));
        }
    }
}
