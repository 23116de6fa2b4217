//! This node's own identity within the cluster.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub id: u32,
    pub listen_addr: String,
    pub wal_dir: std::path::PathBuf,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            id: 0,
            listen_addr: "0.0.0.0:9000".to_owned(),
            wal_dir: std::path::PathBuf::from("./wal"),
        }
    }
}
