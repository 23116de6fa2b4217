//! Wire codec errors.

use thiserror::Error;

/// Errors raised while encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unexpected end of buffer while decoding field {0}")]
    UnexpectedEof(&'static str),

    #[error("invalid utf-8 in string field {0}")]
    InvalidUtf8(&'static str),

    #[error("unknown request kind tag {0}")]
    UnknownRequestKind(u8),

    #[error("unknown response kind tag {0}")]
    UnknownResponseKind(u8),

    #[error("request is missing required field \"{0}\"")]
    MissingField(&'static str),
}
