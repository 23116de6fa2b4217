//! FluxShard: the shard coordination layer of a distributed time-series
//! database. A shard owns a half-open time range of points for a set of
//! series; this crate decides, for each write and query, which replicas and
//! local stores participate and in what order, without itself implementing
//! storage, the wire transport, or query parsing.

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod shard;
pub mod user;
pub mod wire;

pub use error::Error;
