//! Session map <-> text-safe blob conversion.
//!
//! The encoded form is: entry count, then each key string followed by its
//! tagged value, zstd block-compressed and base64-encoded so it can live in
//! a nullable text column.

use std::collections::HashMap;

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::session::SessionMap;

use super::errors::CodecError;
use super::value::{ByteReader, SessionValue, read_value, write_string, write_u32, write_value};

/// Encode the session map into a compressed, base64-encoded blob.
pub fn encode_session_map(map: &SessionMap) -> Result<String, CodecError> {
    let mut buf = Vec::new();
    write_u32(&mut buf, map.len())?;
    for (key, value) in map.iter() {
        write_string(&mut buf, key)?;
        write_value(&mut buf, value)?;
    }

    let compressed = zstd::encode_all(&buf[..], zstd::DEFAULT_COMPRESSION_LEVEL)
        .map_err(|e| CodecError::Compression(e.to_string()))?;
    Ok(STANDARD.encode(compressed))
}

/// Decode a stored blob back into a session map.
///
/// Fails OPEN: any structural error (bad base64, bad compression, truncated
/// or unreadable value stream) is logged and yields an empty map, so
/// corrupted historical session data degrades to "logged out" instead of
/// failing the request. Hijack and timeout handling stay fail-closed.
pub fn decode_session_map(blob: &str) -> SessionMap {
    match try_decode(blob) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!("Undecodable session data, starting with an empty map: {e}");
            SessionMap::new()
        }
    }
}

fn try_decode(blob: &str) -> Result<SessionMap, CodecError> {
    let compressed = STANDARD
        .decode(blob.trim())
        .map_err(|e| CodecError::Base64(e.to_string()))?;
    let bytes = zstd::decode_all(&compressed[..])
        .map_err(|e| CodecError::Compression(e.to_string()))?;

    let mut reader = ByteReader::new(&bytes);
    let count = reader.read_u32()? as usize;
    let mut entries: HashMap<String, SessionValue> = HashMap::with_capacity(count.min(64));
    for _ in 0..count {
        let key = reader.read_string()?;
        let value = read_value(&mut reader)?;
        entries.insert(key, value);
    }
    if !reader.is_exhausted() {
        return Err(CodecError::Truncated);
    }

    Ok(SessionMap::from_entries(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::value::Scalar;
    use proptest::prelude::*;

    fn sample_map() -> SessionMap {
        let mut map = SessionMap::new();
        map.insert("theme", SessionValue::text("dark")).unwrap();
        map.insert("visit_count", SessionValue::int(7)).unwrap();
        map.insert("flagged", SessionValue::Scalar(Scalar::Bool(false)))
            .unwrap();
        map.insert(
            "recent_ids",
            SessionValue::Blob(crate::codec::pack_ids(&[10, 11, 12])),
        )
        .unwrap();
        map
    }

    #[test]
    fn test_roundtrip_sample_map() {
        let blob = encode_session_map(&sample_map()).unwrap();
        assert_eq!(decode_session_map(&blob), sample_map());
    }

    #[test]
    fn test_roundtrip_empty_map() {
        let blob = encode_session_map(&SessionMap::new()).unwrap();
        assert_eq!(decode_session_map(&blob), SessionMap::new());
    }

    #[test]
    fn test_blob_is_text_safe() {
        let blob = encode_session_map(&sample_map()).unwrap();
        assert!(blob.is_ascii());
        assert!(!blob.contains('\0'));
    }

    #[test]
    fn test_decode_fails_open_on_bad_base64() {
        assert_eq!(decode_session_map("%%% not base64 %%%"), SessionMap::new());
    }

    #[test]
    fn test_decode_fails_open_on_bad_compression() {
        let blob = STANDARD.encode(b"not a zstd frame");
        assert_eq!(decode_session_map(&blob), SessionMap::new());
    }

    #[test]
    fn test_decode_fails_open_on_truncated_stream() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 3).unwrap();
        write_string(&mut buf, "only_key").unwrap();
        let compressed =
            zstd::encode_all(&buf[..], zstd::DEFAULT_COMPRESSION_LEVEL).unwrap();
        let blob = STANDARD.encode(compressed);
        assert_eq!(decode_session_map(&blob), SessionMap::new());
    }

    fn scalar_strategy() -> impl Strategy<Value = Scalar> {
        prop_oneof![
            any::<bool>().prop_map(Scalar::Bool),
            any::<i64>().prop_map(Scalar::Int),
            (-1.0e9f64..1.0e9f64).prop_map(Scalar::Float),
            "[ -~]{0,24}".prop_map(Scalar::Text),
        ]
    }

    fn value_strategy() -> impl Strategy<Value = SessionValue> {
        let leaf = prop_oneof![
            Just(SessionValue::Null),
            scalar_strategy().prop_map(SessionValue::Scalar),
            prop::collection::vec(any::<u8>(), 0..24).prop_map(SessionValue::Blob),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(SessionValue::List),
                prop::collection::btree_map("[a-z]{1,8}", inner, 0..4)
                    .prop_map(SessionValue::Map),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_roundtrip_arbitrary_maps(
            entries in prop::collection::hash_map("[a-z_]{1,12}", value_strategy(), 0..6)
        ) {
            let map = SessionMap::from_entries(entries);
            let blob = encode_session_map(&map).unwrap();
            prop_assert_eq!(decode_session_map(&blob), map);
        }
    }
}
