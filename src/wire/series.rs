//! A named, field-typed collection of points.

use bytes::Bytes;

use super::codec::{decode_string, Decode, Encode, FieldReader, FieldWriter};
use super::point::Point;
use super::Error;

const TAG_NAME: u8 = 1;
const TAG_FIELD: u8 = 2;
const TAG_POINT: u8 = 3;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub name: String,
    pub fields: Vec<String>,
    pub points: Vec<Point>,
}

impl Series {
    pub fn new(name: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            fields,
            points: vec![],
        }
    }

    /// First positional match, or `-1` if the field isn't declared on this
    /// series.
    pub fn field_index(&self, name: &str) -> i64 {
        self.fields
            .iter()
            .position(|f| f == name)
            .map(|i| i as i64)
            .unwrap_or(-1)
    }
}

impl Encode for Series {
    fn encode(&self, buf: &mut FieldWriter) {
        buf.write_str(TAG_NAME, &self.name);
        for field in &self.fields {
            buf.write_str(TAG_FIELD, field);
        }
        for point in &self.points {
            let mut inner = FieldWriter::new();
            point.encode(&mut inner);
            buf.write_message(TAG_POINT, &inner.freeze());
        }
    }
}

impl Decode for Series {
    fn decode(bytes: Bytes) -> Result<Self, Error> {
        let mut series = Series::default();
        let mut reader = FieldReader::new(bytes);

        while let Some((tag, payload)) = reader.next_field() {
            match tag {
                TAG_NAME => series.name = decode_string(payload, "series.name")?,
                TAG_FIELD => series.fields.push(decode_string(payload, "series.field")?),
                TAG_POINT => series.points.push(Point::decode(payload)?),
                _ => continue,
            }
        }

        Ok(series)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::wire::field_value::FieldValue;

    #[test]
    fn test_field_index() {
        let series = Series::new("cpu", vec!["host".into(), "usage".into()]);
        assert_eq!(series.field_index("host"), 0);
        assert_eq!(series.field_index("usage"), 1);
        assert_eq!(series.field_index("missing"), -1);
    }

    #[test]
    fn test_roundtrip() {
        let mut series = Series::new("cpu", vec!["host".into()]);
        series.points.push(Point::new(Some(1), vec![FieldValue::String("a".into())]));
        series.points.push(Point::new(Some(2), vec![FieldValue::Null]));

        let mut w = FieldWriter::new();
        series.encode(&mut w);
        let decoded = Series::decode(w.freeze()).unwrap();
        assert_eq!(decoded, series);
    }
}
