//! Field-tagged binary codec.
//!
//! Every encoded field is written as `tag: u8, len: u32 (BE), payload: [u8; len]`.
//! A decoder that doesn't recognize a tag skips `len` bytes and moves on, which
//! gives the format forward and backward compatibility: old readers tolerate
//! new fields, new readers tolerate messages missing fields they'd otherwise
//! expect (those decode as `None`/`null`).

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::Error;

/// Anything that can serialize itself to the wire format.
pub trait Encode {
    fn encode(&self, buf: &mut FieldWriter);
}

/// Anything that can be parsed back out of the wire format.
pub trait Decode: Sized {
    fn decode(bytes: Bytes) -> Result<Self, Error>;
}

/// Appends tagged fields to an in-progress message.
#[derive(Default)]
pub struct FieldWriter {
    buf: BytesMut,
}

impl FieldWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_raw(&mut self, tag: u8, payload: &[u8]) {
        self.buf.put_u8(tag);
        self.buf.put_u32(payload.len() as u32);
        self.buf.put_slice(payload);
    }

    pub fn write_i64(&mut self, tag: u8, value: i64) {
        self.write_raw(tag, &value.to_be_bytes());
    }

    pub fn write_u64(&mut self, tag: u8, value: u64) {
        self.write_raw(tag, &value.to_be_bytes());
    }

    pub fn write_u32(&mut self, tag: u8, value: u32) {
        self.write_raw(tag, &value.to_be_bytes());
    }

    pub fn write_f64(&mut self, tag: u8, value: f64) {
        self.write_raw(tag, &value.to_be_bytes());
    }

    pub fn write_bool(&mut self, tag: u8, value: bool) {
        self.write_raw(tag, &[value as u8]);
    }

    pub fn write_u8(&mut self, tag: u8, value: u8) {
        self.write_raw(tag, &[value]);
    }

    pub fn write_str(&mut self, tag: u8, value: &str) {
        self.write_raw(tag, value.as_bytes());
    }

    pub fn write_bytes(&mut self, tag: u8, value: &[u8]) {
        self.write_raw(tag, value);
    }

    /// Embed a nested, already-encoded message under a tag.
    pub fn write_message(&mut self, tag: u8, encoded: &[u8]) {
        self.write_raw(tag, encoded);
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Walks tagged fields out of a decoded message, in order, skipping anything
/// it doesn't recognize.
pub struct FieldReader {
    bytes: Bytes,
}

impl FieldReader {
    pub fn new(bytes: Bytes) -> Self {
        Self { bytes }
    }

    /// Returns the next `(tag, payload)` pair, or `None` at end of buffer.
    pub fn next_field(&mut self) -> Option<(u8, Bytes)> {
        if self.bytes.remaining() < 5 {
            return None;
        }

        let tag = self.bytes.get_u8();
        let len = self.bytes.get_u32() as usize;

        if self.bytes.remaining() < len {
            return None;
        }

        Some((tag, self.bytes.split_to(len)))
    }
}

pub fn decode_i64(mut payload: Bytes, field: &'static str) -> Result<i64, Error> {
    if payload.remaining() < 8 {
        return Err(Error::UnexpectedEof(field));
    }
    Ok(payload.get_i64())
}

pub fn decode_u64(mut payload: Bytes, field: &'static str) -> Result<u64, Error> {
    if payload.remaining() < 8 {
        return Err(Error::UnexpectedEof(field));
    }
    Ok(payload.get_u64())
}

pub fn decode_u32(mut payload: Bytes, field: &'static str) -> Result<u32, Error> {
    if payload.remaining() < 4 {
        return Err(Error::UnexpectedEof(field));
    }
    Ok(payload.get_u32())
}

pub fn decode_f64(mut payload: Bytes, field: &'static str) -> Result<f64, Error> {
    if payload.remaining() < 8 {
        return Err(Error::UnexpectedEof(field));
    }
    Ok(payload.get_f64())
}

pub fn decode_bool(mut payload: Bytes, field: &'static str) -> Result<bool, Error> {
    if !payload.has_remaining() {
        return Err(Error::UnexpectedEof(field));
    }
    Ok(payload.get_u8() != 0)
}

pub fn decode_u8(mut payload: Bytes, field: &'static str) -> Result<u8, Error> {
    if !payload.has_remaining() {
        return Err(Error::UnexpectedEof(field));
    }
    Ok(payload.get_u8())
}

pub fn decode_string(payload: Bytes, field: &'static str) -> Result<String, Error> {
    String::from_utf8(payload.to_vec()).map_err(|_| Error::InvalidUtf8(field))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_roundtrip_mixed_fields() {
        let mut w = FieldWriter::new();
        w.write_i64(1, -42);
        w.write_str(2, "hello");
        w.write_bool(3, true);
        let bytes = w.freeze();

        let mut r = FieldReader::new(bytes);
        let (tag, payload) = r.next_field().unwrap();
        assert_eq!(tag, 1);
        assert_eq!(decode_i64(payload, "x").unwrap(), -42);

        let (tag, payload) = r.next_field().unwrap();
        assert_eq!(tag, 2);
        assert_eq!(decode_string(payload, "x").unwrap(), "hello");

        let (tag, payload) = r.next_field().unwrap();
        assert_eq!(tag, 3);
        assert!(decode_bool(payload, "x").unwrap());

        assert!(r.next_field().is_none());
    }

    #[test]
    fn test_unknown_tag_is_skipped() {
        let mut w = FieldWriter::new();
        w.write_i64(99, 123); // field a future version added
        w.write_str(2, "still here");
        let bytes = w.freeze();

        let mut r = FieldReader::new(bytes);
        let mut found = None;
        while let Some((tag, payload)) = r.next_field() {
            if tag == 2 {
                found = Some(decode_string(payload, "x").unwrap());
            }
            // tag 99 just falls through unmatched, as a real decoder would.
        }
        assert_eq!(found.as_deref(), Some("still here"));
    }
}
