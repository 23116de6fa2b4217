//! Settings that don't belong to any single collaborator.

use serde::{Deserialize, Serialize};

use crate::coordinator::query_processor::{DESTRUCTIVE_PASSTHROUGH_CAP, PLAIN_PASSTHROUGH_CAP};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        LogFormat::Json
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    /// Channel capacity for non-aggregating passthrough queries that aren't
    /// on the destructive path.
    pub query_processor_buffer_small: usize,
    /// Channel capacity for DELETE_FROM_SERIES / DROP_SERIES / single-point
    /// passthrough queries.
    pub query_processor_buffer_large: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: LogFormat::default(),
            query_processor_buffer_small: PLAIN_PASSTHROUGH_CAP,
            query_processor_buffer_large: DESTRUCTIVE_PASSTHROUGH_CAP,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_default_config_serializable() {
        let config = Config::default();
        let serialized = toml::to_string(&config).expect("default config must serialize");
        let round_tripped: Config = toml::from_str(&serialized).expect("round-trip must parse");
        assert_eq!(round_tripped.node, config.node);
        assert_eq!(round_tripped.general, config.general);
    }
}
