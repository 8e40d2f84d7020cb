//! Self-describing tagged values for session state.
//!
//! Every value is written as a one-byte discriminant followed by the value's
//! own encoding, so a reader can reconstruct arbitrary session entries
//! without an external schema. Lengths and counts are little-endian u32;
//! integers and float bits are little-endian fixed width.

use std::collections::BTreeMap;

use super::errors::CodecError;

const TAG_NULL: u8 = 0x00;
const TAG_SCALAR: u8 = 0x01;
const TAG_LIST: u8 = 0x02;
const TAG_MAP: u8 = 0x03;
const TAG_BLOB: u8 = 0x04;

const SCALAR_BOOL: u8 = 0x00;
const SCALAR_INT: u8 = 0x01;
const SCALAR_FLOAT: u8 = 0x02;
const SCALAR_TEXT: u8 = 0x03;

// Nesting bound for decoding untrusted blobs; session state is shallow in
// practice and anything deeper is treated as structurally invalid.
const MAX_DEPTH: usize = 32;

/// A primitive session value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// An arbitrary session value, reconstructible from its own encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionValue {
    Null,
    Scalar(Scalar),
    List(Vec<SessionValue>),
    Map(BTreeMap<String, SessionValue>),
    Blob(Vec<u8>),
}

impl SessionValue {
    /// Shorthand for a text scalar.
    pub fn text(value: impl Into<String>) -> Self {
        SessionValue::Scalar(Scalar::Text(value.into()))
    }

    /// Shorthand for an integer scalar.
    pub fn int(value: i64) -> Self {
        SessionValue::Scalar(Scalar::Int(value))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SessionValue::Scalar(Scalar::Text(text)) => Some(text),
            _ => None,
        }
    }
}

pub(super) fn write_u32(buf: &mut Vec<u8>, value: usize) -> Result<(), CodecError> {
    let value = u32::try_from(value).map_err(|_| CodecError::Oversize(value))?;
    buf.extend_from_slice(&value.to_le_bytes());
    Ok(())
}

pub(super) fn write_string(buf: &mut Vec<u8>, value: &str) -> Result<(), CodecError> {
    write_u32(buf, value.len())?;
    buf.extend_from_slice(value.as_bytes());
    Ok(())
}

fn write_scalar(buf: &mut Vec<u8>, scalar: &Scalar) -> Result<(), CodecError> {
    match scalar {
        Scalar::Bool(value) => {
            buf.push(SCALAR_BOOL);
            buf.push(u8::from(*value));
        }
        Scalar::Int(value) => {
            buf.push(SCALAR_INT);
            buf.extend_from_slice(&value.to_le_bytes());
        }
        Scalar::Float(value) => {
            buf.push(SCALAR_FLOAT);
            buf.extend_from_slice(&value.to_bits().to_le_bytes());
        }
        Scalar::Text(value) => {
            buf.push(SCALAR_TEXT);
            write_string(buf, value)?;
        }
    }
    Ok(())
}

pub(super) fn write_value(buf: &mut Vec<u8>, value: &SessionValue) -> Result<(), CodecError> {
    match value {
        SessionValue::Null => buf.push(TAG_NULL),
        SessionValue::Scalar(scalar) => {
            buf.push(TAG_SCALAR);
            write_scalar(buf, scalar)?;
        }
        SessionValue::List(items) => {
            buf.push(TAG_LIST);
            write_u32(buf, items.len())?;
            for item in items {
                write_value(buf, item)?;
            }
        }
        SessionValue::Map(entries) => {
            buf.push(TAG_MAP);
            write_u32(buf, entries.len())?;
            for (key, entry) in entries {
                write_string(buf, key)?;
                write_value(buf, entry)?;
            }
        }
        SessionValue::Blob(bytes) => {
            buf.push(TAG_BLOB);
            write_u32(buf, bytes.len())?;
            buf.extend_from_slice(bytes);
        }
    }
    Ok(())
}

/// Cursor over an encoded byte stream.
pub(super) struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(super) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(super) fn is_exhausted(&self) -> bool {
        self.pos == self.bytes.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.bytes.len() - self.pos < len {
            return Err(CodecError::Truncated);
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub(super) fn read_u32(&mut self) -> Result<u32, CodecError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().map_err(|_| CodecError::Truncated)?;
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_i64(&mut self) -> Result<i64, CodecError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().map_err(|_| CodecError::Truncated)?;
        Ok(i64::from_le_bytes(bytes))
    }

    fn read_f64(&mut self) -> Result<f64, CodecError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().map_err(|_| CodecError::Truncated)?;
        Ok(f64::from_bits(u64::from_le_bytes(bytes)))
    }

    pub(super) fn read_string(&mut self) -> Result<String, CodecError> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }
}

fn read_scalar(reader: &mut ByteReader<'_>) -> Result<Scalar, CodecError> {
    match reader.read_u8()? {
        SCALAR_BOOL => Ok(Scalar::Bool(reader.read_u8()? != 0)),
        SCALAR_INT => Ok(Scalar::Int(reader.read_i64()?)),
        SCALAR_FLOAT => Ok(Scalar::Float(reader.read_f64()?)),
        SCALAR_TEXT => Ok(Scalar::Text(reader.read_string()?)),
        tag => Err(CodecError::UnknownTag(tag)),
    }
}

pub(super) fn read_value(reader: &mut ByteReader<'_>) -> Result<SessionValue, CodecError> {
    read_value_at(reader, MAX_DEPTH)
}

fn read_value_at(reader: &mut ByteReader<'_>, depth: usize) -> Result<SessionValue, CodecError> {
    if depth == 0 {
        return Err(CodecError::DepthExceeded);
    }
    match reader.read_u8()? {
        TAG_NULL => Ok(SessionValue::Null),
        TAG_SCALAR => Ok(SessionValue::Scalar(read_scalar(reader)?)),
        TAG_LIST => {
            let count = reader.read_u32()? as usize;
            let mut items = Vec::new();
            for _ in 0..count {
                items.push(read_value_at(reader, depth - 1)?);
            }
            Ok(SessionValue::List(items))
        }
        TAG_MAP => {
            let count = reader.read_u32()? as usize;
            let mut entries = BTreeMap::new();
            for _ in 0..count {
                let key = reader.read_string()?;
                let entry = read_value_at(reader, depth - 1)?;
                entries.insert(key, entry);
            }
            Ok(SessionValue::Map(entries))
        }
        TAG_BLOB => {
            let len = reader.read_u32()? as usize;
            let bytes = reader.take(len)?;
            Ok(SessionValue::Blob(bytes.to_vec()))
        }
        tag => Err(CodecError::UnknownTag(tag)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: SessionValue) -> SessionValue {
        let mut buf = Vec::new();
        write_value(&mut buf, &value).unwrap();
        let mut reader = ByteReader::new(&buf);
        let decoded = read_value(&mut reader).unwrap();
        assert!(reader.is_exhausted());
        decoded
    }

    #[test]
    fn test_roundtrip_null() {
        assert_eq!(roundtrip(SessionValue::Null), SessionValue::Null);
    }

    #[test]
    fn test_roundtrip_scalars() {
        for value in [
            SessionValue::Scalar(Scalar::Bool(true)),
            SessionValue::Scalar(Scalar::Bool(false)),
            SessionValue::int(i64::MIN),
            SessionValue::int(42),
            SessionValue::Scalar(Scalar::Float(2.5)),
            SessionValue::text(""),
            SessionValue::text("naïve UTF-8 ✓"),
        ] {
            assert_eq!(roundtrip(value.clone()), value);
        }
    }

    #[test]
    fn test_roundtrip_nested() {
        let mut inner = BTreeMap::new();
        inner.insert("level".to_string(), SessionValue::int(3));
        inner.insert(
            "ids".to_string(),
            SessionValue::List(vec![SessionValue::int(1), SessionValue::Null]),
        );
        let value = SessionValue::Map(inner);
        assert_eq!(roundtrip(value.clone()), value);
    }

    #[test]
    fn test_roundtrip_blob() {
        let value = SessionValue::Blob(vec![0x00, 0xFF, 0x10]);
        assert_eq!(roundtrip(value.clone()), value);
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let mut reader = ByteReader::new(&[0x09]);
        assert_eq!(read_value(&mut reader), Err(CodecError::UnknownTag(0x09)));
    }

    #[test]
    fn test_truncated_stream_rejected() {
        // A list claiming one element with no element bytes following.
        let mut buf = Vec::new();
        buf.push(super::TAG_LIST);
        write_u32(&mut buf, 1).unwrap();
        let mut reader = ByteReader::new(&buf);
        assert_eq!(read_value(&mut reader), Err(CodecError::Truncated));
    }

    #[test]
    fn test_excessive_nesting_rejected() {
        // 40 nested single-element lists, deeper than MAX_DEPTH.
        let mut buf = Vec::new();
        for _ in 0..40 {
            buf.push(super::TAG_LIST);
            write_u32(&mut buf, 1).unwrap();
        }
        buf.push(super::TAG_NULL);
        let mut reader = ByteReader::new(&buf);
        assert_eq!(read_value(&mut reader), Err(CodecError::DepthExceeded));
    }
}
