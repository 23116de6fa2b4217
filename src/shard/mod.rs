//! A time-bounded, replicated partition of point data.

pub mod error;
pub mod ordering;

pub use error::Error;

use chrono::{DateTime, Utc};

/// Which retention class a shard belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShardType {
    LongTerm,
    ShortTerm,
}

/// Immutable identity of a shard: id, time range, type, and the replica set
/// that owns it. Totally ordered by `(start_time, id)` — see
/// [`ordering::sort_shards_by_time_ascending`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardDescriptor {
    pub id: u32,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    pub shard_type: ShardType,
    server_ids: Vec<u32>,
    pub duration_is_split: bool,
}

impl ShardDescriptor {
    /// `[start_time, end_time)` must be a valid half-open range.
    pub fn new(
        id: u32,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        shard_type: ShardType,
        server_ids: Vec<u32>,
        duration_is_split: bool,
    ) -> Result<Self, Error> {
        if start_time >= end_time {
            return Err(Error::InvalidRange {
                start: start_time,
                end: end_time,
            });
        }

        let mut server_ids = server_ids;
        server_ids.sort_unstable();

        Ok(Self {
            id,
            start_time,
            end_time,
            shard_type,
            server_ids,
            duration_is_split,
        })
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    /// Shard duration, fixed at construction.
    pub fn shard_duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }

    pub fn start_micro(&self) -> i64 {
        self.start_time.timestamp_micros()
    }

    pub fn end_micro(&self) -> i64 {
        self.end_time.timestamp_micros()
    }

    /// `start_micro <= t < end_micro`.
    pub fn is_microsecond_in_range(&self, t: i64) -> bool {
        t >= self.start_micro() && t < self.end_micro()
    }

    /// Ascending, deduplicated-by-construction replica server ids.
    pub fn server_ids(&self) -> &[u32] {
        &self.server_ids
    }

    /// Replace the replica set, re-sorting it.
    pub fn set_server_ids(&mut self, server_ids: Vec<u32>) {
        self.server_ids = server_ids;
        self.sort_server_ids();
    }

    fn sort_server_ids(&mut self) {
        self.server_ids.sort_unstable();
    }
}
