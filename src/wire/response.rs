//! Response message. A stream is zero-or-more `Query` responses followed by
//! exactly one `EndStream`.

use bytes::Bytes;

use super::codec::{decode_string, decode_u8, Decode, Encode, FieldReader, FieldWriter};
use super::series::Series;
use super::Error;

const TAG_KIND: u8 = 1;
const TAG_SERIES: u8 = 2;
const TAG_ERROR_MESSAGE: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Query,
    EndStream,
}

impl ResponseKind {
    fn tag(self) -> u8 {
        match self {
            ResponseKind::Query => 0,
            ResponseKind::EndStream => 1,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, Error> {
        Ok(match tag {
            0 => ResponseKind::Query,
            1 => ResponseKind::EndStream,
            other => return Err(Error::UnknownResponseKind(other)),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub kind: ResponseKind,
    pub series: Option<Series>,
    pub error_message: Option<String>,
}

impl Response {
    pub fn query(series: Series) -> Self {
        Self {
            kind: ResponseKind::Query,
            series: Some(series),
            error_message: None,
        }
    }

    pub fn end_stream() -> Self {
        Self {
            kind: ResponseKind::EndStream,
            series: None,
            error_message: None,
        }
    }

    pub fn end_stream_with_error(message: impl Into<String>) -> Self {
        Self {
            kind: ResponseKind::EndStream,
            series: None,
            error_message: Some(message.into()),
        }
    }

    pub fn is_end_stream(&self) -> bool {
        self.kind == ResponseKind::EndStream
    }
}

impl Encode for Response {
    fn encode(&self, buf: &mut FieldWriter) {
        buf.write_u8(TAG_KIND, self.kind.tag());
        if let Some(ref series) = self.series {
            let mut inner = FieldWriter::new();
            series.encode(&mut inner);
            buf.write_message(TAG_SERIES, &inner.freeze());
        }
        if let Some(ref message) = self.error_message {
            buf.write_str(TAG_ERROR_MESSAGE, message);
        }
    }
}

impl Decode for Response {
    fn decode(bytes: Bytes) -> Result<Self, Error> {
        let mut kind = None;
        let mut series = None;
        let mut error_message = None;

        let mut reader = FieldReader::new(bytes);
        while let Some((tag, payload)) = reader.next_field() {
            match tag {
                TAG_KIND => kind = Some(ResponseKind::from_tag(decode_u8(payload, "response.kind")?)?),
                TAG_SERIES => series = Some(Series::decode(payload)?),
                TAG_ERROR_MESSAGE => {
                    error_message = Some(decode_string(payload, "response.error_message")?)
                }
                _ => continue,
            }
        }

        Ok(Response {
            kind: kind.ok_or(Error::MissingField("response.kind"))?,
            series,
            error_message,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::wire::point::Point;

    #[test]
    fn test_roundtrip_end_stream_with_error() {
        let resp = Response::end_stream_with_error("No servers up to query shard 3");
        let mut w = FieldWriter::new();
        resp.encode(&mut w);
        let decoded = Response::decode(w.freeze()).unwrap();
        assert_eq!(decoded, resp);
        assert!(decoded.is_end_stream());
    }

    #[test]
    fn test_roundtrip_query_response() {
        let mut series = Series::new("cpu", vec!["host".into()]);
        series.points.push(Point::new(Some(1), vec![]));
        let resp = Response::query(series);

        let mut w = FieldWriter::new();
        resp.encode(&mut w);
        let decoded = Response::decode(w.freeze()).unwrap();
        assert_eq!(decoded, resp);
        assert!(!decoded.is_end_stream());
    }
}
