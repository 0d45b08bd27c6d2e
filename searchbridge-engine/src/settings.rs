use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How the engine node is run relative to this process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatingMode {
    /// A single node on this machine with durable storage.
    #[default]
    Local,
    /// A throwaway in-memory node.
    Memory,
    /// A member of a multi-node cluster.
    Cluster,
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("LOCAL"),
            Self::Memory => f.write_str("MEMORY"),
            Self::Cluster => f.write_str("CLUSTER"),
        }
    }
}

impl FromStr for OperatingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOCAL" => Ok(Self::Local),
            "MEMORY" => Ok(Self::Memory),
            "CLUSTER" => Ok(Self::Cluster),
            other => Err(format!("unknown operating mode: {other}")),
        }
    }
}

/// Settings a connector uses to join or start an engine node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSettings {
    pub mode: OperatingMode,
    pub cluster_name: String,
    /// Whether the node skips network discovery.
    pub local: bool,
    pub shards: u32,
    pub replicas: u32,
    /// Engine-specific settings passed through untouched.
    pub extra: BTreeMap<String, String>,
}

impl NodeSettings {
    /// Derives the node settings for `mode`.
    pub fn for_mode(mode: OperatingMode, cluster_name: impl Into<String>) -> Self {
        let cluster_name = cluster_name.into();
        let mut extra = BTreeMap::new();
        let (local, shards, replicas) = match mode {
            OperatingMode::Memory => {
                extra.insert("node.http.enabled".into(), "false".into());
                extra.insert("gateway.type".into(), "none".into());
                extra.insert("index.gateway.type".into(), "none".into());
                extra.insert("index.store.type".into(), "memory".into());
                (true, 1, 0)
            }
            OperatingMode::Local => (false, 1, 0),
            OperatingMode::Cluster => {
                extra.insert("client.transport.sniff".into(), "true".into());
                (true, 3, 3)
            }
        };
        Self {
            mode,
            cluster_name,
            local,
            shards,
            replicas,
            extra,
        }
    }
}
