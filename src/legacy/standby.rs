use super::LegacyDecodeError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of `standby_info`, written by v1 members that relay for a cluster instead of
/// voting in it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandbyMarker {
    #[serde(rename = "Running", alias = "running", default)]
    pub running: bool,
    #[serde(rename = "Cluster", alias = "cluster", default)]
    pub cluster: Vec<StandbyMember>,
    #[serde(rename = "SyncInterval", alias = "syncInterval", default)]
    pub sync_interval: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandbyMember {
    #[serde(rename = "name", alias = "Name", default)]
    pub name: String,
    #[serde(rename = "state", alias = "State", default)]
    pub state: String,
    #[serde(rename = "clientURL", alias = "ClientURL", default)]
    pub client_url: String,
    #[serde(rename = "peerURL", alias = "PeerURL", default)]
    pub peer_url: String,
}

impl StandbyMarker {
    /// Client URLs of the members this node was relaying for, in recorded order.
    pub fn client_urls(&self) -> Vec<String> {
        self.cluster
            .iter()
            .filter(|member| !member.client_url.is_empty())
            .map(|member| member.client_url.clone())
            .collect()
    }

    /// The recorded membership as a v2 `-initial-cluster` value (`name=peerURL,...`).
    pub fn initial_cluster(&self) -> String {
        self.cluster
            .iter()
            .map(|member| format!("{}={}", member.name, member.peer_url))
            .collect::<Vec<_>>()
            .join(",")
    }
}

pub fn decode_standby_marker_from_file(
    path: impl AsRef<Path>,
) -> Result<StandbyMarker, LegacyDecodeError> {
    let path = path.as_ref();
    let raw = std::fs::read(path).map_err(|err| LegacyDecodeError::io(path, err))?;
    serde_json::from_slice(&raw).map_err(|source| LegacyDecodeError::Json {
        path: path.to_path_buf(),
        source,
    })
}
