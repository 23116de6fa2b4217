//! Abstract contracts the coordinator drives but never implements itself.
//!
//! Production backends (a real WAL, a real storage engine, a real RPC
//! client) live outside this crate; tests substitute mocks.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::shard::ShardDescriptor;
use crate::wire::{Request, Response, Series};

use super::error::Error;
use super::query_processor::QueryProcessor;
use super::query_spec::QuerySpec;

/// Durable, strictly-ordered request log for a single shard.
#[async_trait]
pub trait Wal: Send + Sync {
    /// Atomically assigns the next monotonic request number for `shard` and
    /// durably records `req` before returning it.
    async fn assign_sequence_numbers_and_log(
        &self,
        req: &Request,
        shard: &ShardDescriptor,
    ) -> Result<u64, Error>;

    /// Marks `server_id` as having durably applied `request_number`, enabling
    /// eventual WAL truncation.
    async fn commit(&self, request_number: u64, server_id: u32) -> Result<(), Error>;
}

/// The in-process storage engine's view of shards hosted on this node.
#[async_trait]
pub trait LocalShardStore: Send + Sync {
    async fn write(&self, req: &Request) -> Result<(), Error>;

    /// Enqueue for asynchronous flushing; returns once enqueued, not once
    /// durable.
    async fn buffer_write(&self, req: &Request) -> Result<(), Error>;

    /// Acquire a ref-counted handle to a shard's local database, creating it
    /// if this is the first acquire. Must be paired with exactly one
    /// `return_shard` call per acquire, including on error paths.
    async fn get_or_create_shard(&self, id: u32) -> Result<std::sync::Arc<dyn LocalShardDb>, Error>;

    async fn return_shard(&self, id: u32);

    async fn delete_shard(&self, id: u32) -> Result<(), Error>;
}

/// A single shard's on-disk database, hosted locally.
#[async_trait]
pub trait LocalShardDb: Send + Sync {
    async fn write(&self, database: &str, series: &Series) -> Result<(), Error>;

    /// Drives `processor.yield_point` for every matching point and calls
    /// `processor.close()` exactly once before returning.
    async fn query(
        &self,
        spec: &dyn QuerySpec,
        processor: &mut dyn QueryProcessor,
    ) -> Result<(), Error>;

    async fn drop_database(&self, database: &str) -> Result<(), Error>;
}

/// A peer node holding a replica of this shard.
#[async_trait]
pub trait ClusterServer: Send + Sync {
    fn id(&self) -> u32;

    fn is_up(&self) -> bool;

    async fn buffer_write(&self, req: &Request) -> Result<(), Error>;

    /// Asynchronous from the caller's perspective: returns once the peer has
    /// finished sending responses on `tx`, terminated by an `EndStream`.
    async fn make_request(&self, req: Request, tx: mpsc::Sender<Response>) -> Result<(), Error>;
}
