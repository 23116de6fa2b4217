//! Configuration loading.
//!
//! A missing file is not an error, a malformed one is. There's no hot-reload
//! story here, so `load` hands back a plain owned value instead of a
//! globally-swappable one; callers that want to pick up edits re-`load`.

pub mod error;
pub mod general;
pub mod node;
pub mod users;

pub use error::Error;
pub use general::{GeneralConfig, LogFormat};
pub use node::NodeConfig;
pub use users::UsersConfig;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub node: NodeConfig,
    pub general: GeneralConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let config: Config = toml::from_str(&contents).map_err(|source| Error::Parse {
                    path: path.display().to_string(),
                    source,
                })?;
                info!(path = %path.display(), "loaded configuration");
                Ok(config)
            }
            Err(_) => {
                warn!(path = %path.display(), "\"{}\" doesn't exist, loading defaults instead", path.display());
                Ok(Config::default())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_missing_file_loads_defaults() {
        let config = Config::load("/nonexistent/fluxshard.toml").unwrap();
        assert_eq!(config.node.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_parses_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fluxshard.toml");
        std::fs::write(
            &path,
            r#"
            [node]
            id = 3
            listen_addr = "127.0.0.1:7000"
            wal_dir = "/var/lib/fluxshard/wal"

            [general]
            log_level = "debug"
            "#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.node.id, 3);
        assert_eq!(config.node.listen_addr, "127.0.0.1:7000");
        assert_eq!(config.node.wal_dir, std::path::PathBuf::from("/var/lib/fluxshard/wal"));
        assert_eq!(config.general.log_level, "debug");
        // Unset fields still fall back to their defaults.
        assert_eq!(config.general.query_processor_buffer_small, 1_000);
        assert_eq!(config.general.query_processor_buffer_large, 10_000);
    }

    #[test]
    fn test_malformed_toml_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fluxshard.toml");
        std::fs::write(&path, "not valid toml [[[").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
