//! Shard coordinator errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("wal error: {0}")]
    Wal(String),

    #[error("local store error: {0}")]
    Store(String),

    #[error("remote server error: {0}")]
    Server(String),

    #[error("no servers up to query shard {shard_id}")]
    NoServersUp { shard_id: u32 },

    #[error("response channel closed")]
    ChannelClosed,
}
