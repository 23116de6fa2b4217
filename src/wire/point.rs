//! A single timestamped observation with an ordered set of field values.

use std::cmp::Ordering;

use bytes::Bytes;

use super::codec::{decode_i64, decode_u64, Decode, Encode, FieldReader, FieldWriter};
use super::field_value::FieldValue;
use super::Error;

const TAG_TIMESTAMP: u8 = 1;
const TAG_SEQUENCE_NUMBER: u8 = 2;
const TAG_VALUE: u8 = 3;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Point {
    /// Microseconds since the Unix epoch.
    pub timestamp: Option<i64>,
    /// Assigned by the WAL write path; absent until then.
    pub sequence_number: Option<u64>,
    /// Positionally aligned with the owning series' `fields`.
    pub values: Vec<FieldValue>,
}

impl Point {
    pub fn new(timestamp: Option<i64>, values: Vec<FieldValue>) -> Self {
        Self {
            timestamp,
            sequence_number: None,
            values,
        }
    }

    /// Render the value at `index` as a string for display/debugging.
    ///
    /// int64 -> base-10, double -> shortest round-trip decimal with no
    /// trailing zeros, string -> raw, anything else (bool, null, missing,
    /// out-of-range or negative index) -> empty string.
    pub fn field_value_as_string(&self, index: i64) -> String {
        if index < 0 {
            return String::new();
        }

        match self.values.get(index as usize) {
            Some(FieldValue::Int64(i)) => i.to_string(),
            Some(FieldValue::Double(d)) => format_double(*d),
            Some(FieldValue::String(s)) => s.clone(),
            _ => String::new(),
        }
    }
}

/// Shortest round-trip decimal, no trailing zeros, no exponent for the
/// common case (e.g. `1.0` -> `"1"`, `1.5` -> `"1.5"`).
fn format_double(d: f64) -> String {
    if d == d.trunc() && d.abs() < 1e15 {
        format!("{}", d as i64)
    } else {
        let s = format!("{}", d);
        s
    }
}

impl Encode for Point {
    fn encode(&self, buf: &mut FieldWriter) {
        if let Some(ts) = self.timestamp {
            buf.write_i64(TAG_TIMESTAMP, ts);
        }
        if let Some(seq) = self.sequence_number {
            buf.write_u64(TAG_SEQUENCE_NUMBER, seq);
        }
        for value in &self.values {
            let mut inner = FieldWriter::new();
            value.encode(&mut inner);
            buf.write_message(TAG_VALUE, &inner.freeze());
        }
    }
}

impl Decode for Point {
    fn decode(bytes: Bytes) -> Result<Self, Error> {
        let mut point = Point::default();
        let mut reader = FieldReader::new(bytes);

        while let Some((tag, payload)) = reader.next_field() {
            match tag {
                TAG_TIMESTAMP => point.timestamp = Some(decode_i64(payload, "point.timestamp")?),
                TAG_SEQUENCE_NUMBER => {
                    point.sequence_number = Some(decode_u64(payload, "point.sequence_number")?)
                }
                TAG_VALUE => point.values.push(FieldValue::decode(payload)?),
                _ => continue,
            }
        }

        Ok(point)
    }
}

/// Orders points by timestamp ascending. A point with no timestamp compares
/// as equal to everything: a missing timestamp is treated as unordered
/// rather than sunk to an arbitrary end. `sort_by` is therefore not a strict
/// weak ordering when nulls are present; callers that need a total order
/// should filter nulls out first.
pub fn cmp_by_time_asc(a: &Point, b: &Point) -> Ordering {
    match (a.timestamp, b.timestamp) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => Ordering::Equal,
    }
}

/// Descending counterpart of [`cmp_by_time_asc`]; nulls are handled the same
/// way (neither sinks to an end, `Ordering::Equal` for any pair involving one).
pub fn cmp_by_time_desc(a: &Point, b: &Point) -> Ordering {
    match (a.timestamp, b.timestamp) {
        (Some(a), Some(b)) => b.cmp(&a),
        _ => Ordering::Equal,
    }
}
