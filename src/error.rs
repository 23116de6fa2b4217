//! Crate-wide error type, aggregating each submodule's own error via `#[from]`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Wire(#[from] crate::wire::Error),

    #[error(transparent)]
    Shard(#[from] crate::shard::Error),

    #[error(transparent)]
    User(#[from] crate::user::Error),

    #[error(transparent)]
    Coordinator(#[from] crate::coordinator::Error),

    #[error(transparent)]
    Config(#[from] crate::config::Error),

    #[error(transparent)]
    Cli(#[from] crate::cli::ConfigCheckError),
}
