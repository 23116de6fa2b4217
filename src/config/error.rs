//! Config-loading errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to parse \"{path}\": {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
