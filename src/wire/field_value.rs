//! Tagged-union field value carried by a [`super::Point`].

use super::codec::{decode_bool, decode_f64, decode_i64, decode_string, Decode, Encode, FieldWriter};
use super::Error;
use bytes::Bytes;

const TAG_STRING: u8 = 1;
const TAG_DOUBLE: u8 = 2;
const TAG_INT64: u8 = 3;
const TAG_BOOL: u8 = 4;

/// A single field's value in a point. Exactly one variant is ever populated;
/// `Null` models the absent-field case directly as a variant rather than
/// wrapping the whole enum in `Option`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Double(f64),
    Int64(i64),
    Bool(bool),
    Null,
}

impl FieldValue {
    /// Resolve the declared priority order when more than one wire variant
    /// was set on a malformed input: string > double > int64 > bool > null.
    ///
    /// `decode` already applies this rule while parsing, so for values built
    /// in-process this just returns `self`. Exposed as its own accessor so
    /// callers don't need to match on the enum just to read the value back.
    pub fn value(&self) -> &FieldValue {
        self
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl Encode for FieldValue {
    fn encode(&self, buf: &mut FieldWriter) {
        match self {
            FieldValue::String(s) => buf.write_str(TAG_STRING, s),
            FieldValue::Double(d) => buf.write_f64(TAG_DOUBLE, *d),
            FieldValue::Int64(i) => buf.write_i64(TAG_INT64, *i),
            FieldValue::Bool(b) => buf.write_bool(TAG_BOOL, *b),
            FieldValue::Null => {}
        }
    }
}

impl Decode for FieldValue {
    /// Decodes a single field-value record. Wire inputs may set more than one
    /// variant (malformed); all fields are scanned and the highest-priority
    /// one present wins (string > double > int64 > bool > null), so a later,
    /// lower-priority tag never overrides an earlier, higher-priority one.
    fn decode(bytes: Bytes) -> Result<Self, Error> {
        use super::codec::FieldReader;

        let mut string_val = None;
        let mut double_val = None;
        let mut int64_val = None;
        let mut bool_val = None;

        let mut reader = FieldReader::new(bytes);
        while let Some((tag, payload)) = reader.next_field() {
            match tag {
                TAG_STRING if string_val.is_none() => {
                    string_val = Some(decode_string(payload, "field_value.string")?)
                }
                TAG_DOUBLE if double_val.is_none() => {
                    double_val = Some(decode_f64(payload, "field_value.double")?)
                }
                TAG_INT64 if int64_val.is_none() => {
                    int64_val = Some(decode_i64(payload, "field_value.int64")?)
                }
                TAG_BOOL if bool_val.is_none() => {
                    bool_val = Some(decode_bool(payload, "field_value.bool")?)
                }
                _ => continue,
            }
        }

        Ok(if let Some(s) = string_val {
            FieldValue::String(s)
        } else if let Some(d) = double_val {
            FieldValue::Double(d)
        } else if let Some(i) = int64_val {
            FieldValue::Int64(i)
        } else if let Some(b) = bool_val {
            FieldValue::Bool(b)
        } else {
            FieldValue::Null
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::wire::codec::FieldWriter;

    fn roundtrip(v: &FieldValue) -> FieldValue {
        let mut w = FieldWriter::new();
        v.encode(&mut w);
        FieldValue::decode(w.freeze()).unwrap()
    }

    #[test]
    fn test_roundtrip_each_variant() {
        assert_eq!(roundtrip(&FieldValue::String("x".into())), FieldValue::String("x".into()));
        assert_eq!(roundtrip(&FieldValue::Double(1.5)), FieldValue::Double(1.5));
        assert_eq!(roundtrip(&FieldValue::Int64(42)), FieldValue::Int64(42));
        assert_eq!(roundtrip(&FieldValue::Bool(true)), FieldValue::Bool(true));
        assert_eq!(roundtrip(&FieldValue::Null), FieldValue::Null);
    }

    #[test]
    fn test_priority_order_on_malformed_input() {
        // Simulate a malformed wire input that sets multiple variants at once.
        let mut w = FieldWriter::new();
        FieldValue::Bool(true).encode(&mut w);
        FieldValue::Int64(7).encode(&mut w);
        FieldValue::Double(2.0).encode(&mut w);
        FieldValue::String("s".into()).encode(&mut w);

        let decoded = FieldValue::decode(w.freeze()).unwrap();
        assert_eq!(decoded, FieldValue::String("s".into()));
    }

    #[test]
    fn test_priority_order_double_over_int_over_bool() {
        let mut w = FieldWriter::new();
        FieldValue::Bool(true).encode(&mut w);
        FieldValue::Int64(7).encode(&mut w);
        FieldValue::Double(2.0).encode(&mut w);

        assert_eq!(FieldValue::decode(w.freeze()).unwrap(), FieldValue::Double(2.0));
    }
}
