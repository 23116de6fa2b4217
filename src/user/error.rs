//! User / ACL errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}
