//! Shard descriptor errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("shard start time {start} must be before end time {end}")]
    InvalidRange {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },
}
