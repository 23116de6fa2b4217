//! Request message exchanged between a shard coordinator and its replicas.

use bytes::Bytes;

use super::codec::{
    decode_bool, decode_string, decode_u32, decode_u64, decode_u8, Decode, Encode, FieldReader,
    FieldWriter,
};
use super::series::Series;
use super::Error;

const TAG_KIND: u8 = 1;
const TAG_ID: u8 = 2;
const TAG_SHARD_ID: u8 = 3;
const TAG_DATABASE: u8 = 4;
const TAG_QUERY: u8 = 5;
const TAG_USER_NAME: u8 = 6;
const TAG_IS_DB_USER: u8 = 7;
const TAG_REQUEST_NUMBER: u8 = 8;
const TAG_SERIES: u8 = 9;

/// What a [`Request`] asks a shard (or its replica) to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Query,
    Write,
    DropDatabase,
    DeleteFromSeries,
    DropSeries,
}

impl RequestKind {
    fn tag(self) -> u8 {
        match self {
            RequestKind::Query => 0,
            RequestKind::Write => 1,
            RequestKind::DropDatabase => 2,
            RequestKind::DeleteFromSeries => 3,
            RequestKind::DropSeries => 4,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, Error> {
        Ok(match tag {
            0 => RequestKind::Query,
            1 => RequestKind::Write,
            2 => RequestKind::DropDatabase,
            3 => RequestKind::DeleteFromSeries,
            4 => RequestKind::DropSeries,
            other => return Err(Error::UnknownRequestKind(other)),
        })
    }

    /// A query that mutates or removes data and therefore must be durably
    /// logged and applied on every replica.
    pub fn is_destructive(self) -> bool {
        matches!(
            self,
            RequestKind::DeleteFromSeries | RequestKind::DropSeries | RequestKind::DropDatabase
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    pub kind: Option<RequestKind>,
    /// Zeroed by the coordinator before each per-replica fan-out call in the
    /// destructive-query path so the RPC layer assigns a fresh per-call id.
    pub id: Option<u32>,
    pub shard_id: Option<u32>,
    pub database: Option<String>,
    pub query: Option<String>,
    pub user_name: Option<String>,
    pub is_db_user: Option<bool>,
    /// Assigned by the WAL; monotonic per shard.
    pub request_number: Option<u64>,
    pub series: Option<Series>,
}

impl Request {
    pub fn new(kind: RequestKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }
}

impl Encode for Request {
    fn encode(&self, buf: &mut FieldWriter) {
        if let Some(kind) = self.kind {
            buf.write_u8(TAG_KIND, kind.tag());
        }
        if let Some(id) = self.id {
            buf.write_u32(TAG_ID, id);
        }
        if let Some(shard_id) = self.shard_id {
            buf.write_u32(TAG_SHARD_ID, shard_id);
        }
        if let Some(ref db) = self.database {
            buf.write_str(TAG_DATABASE, db);
        }
        if let Some(ref query) = self.query {
            buf.write_str(TAG_QUERY, query);
        }
        if let Some(ref user_name) = self.user_name {
            buf.write_str(TAG_USER_NAME, user_name);
        }
        if let Some(is_db_user) = self.is_db_user {
            buf.write_bool(TAG_IS_DB_USER, is_db_user);
        }
        if let Some(request_number) = self.request_number {
            buf.write_u64(TAG_REQUEST_NUMBER, request_number);
        }
        if let Some(ref series) = self.series {
            let mut inner = FieldWriter::new();
            series.encode(&mut inner);
            buf.write_message(TAG_SERIES, &inner.freeze());
        }
    }
}

impl Decode for Request {
    fn decode(bytes: Bytes) -> Result<Self, Error> {
        let mut request = Request::default();
        let mut reader = FieldReader::new(bytes);

        while let Some((tag, payload)) = reader.next_field() {
            match tag {
                TAG_KIND => {
                    request.kind = Some(RequestKind::from_tag(decode_u8(payload, "request.kind")?)?)
                }
                TAG_ID => request.id = Some(decode_u32(payload, "request.id")?),
                TAG_SHARD_ID => request.shard_id = Some(decode_u32(payload, "request.shard_id")?),
                TAG_DATABASE => request.database = Some(decode_string(payload, "request.database")?),
                TAG_QUERY => request.query = Some(decode_string(payload, "request.query")?),
                TAG_USER_NAME => {
                    request.user_name = Some(decode_string(payload, "request.user_name")?)
                }
                TAG_IS_DB_USER => {
                    request.is_db_user = Some(decode_bool(payload, "request.is_db_user")?)
                }
                TAG_REQUEST_NUMBER => {
                    request.request_number = Some(decode_u64(payload, "request.request_number")?)
                }
                TAG_SERIES => request.series = Some(Series::decode(payload)?),
                _ => continue,
            }
        }

        Ok(request)
    }
}
