use super::ProbeError;
use crate::net::{HttpTransport, RequestDeadline};
use log::{debug, info};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Upper bound on the discovery lookup, covering connect, write and read.
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Child keys of a discovery token that hold cluster metadata rather than peers.
const METADATA_KEYS: [&str; 2] = ["_config", "_state"];

#[derive(Deserialize)]
struct KeysReply {
    node: DirNode,
}

#[derive(Deserialize)]
struct DirNode {
    #[serde(default)]
    nodes: Vec<KeyNode>,
}

#[derive(Deserialize)]
struct KeyNode {
    key: String,
    #[serde(default)]
    value: String,
}

/// Lists the peer URLs registered under a discovery token. No URL means no peers.
pub fn fetch_discovery_peers(
    transport: &dyn HttpTransport,
    discovery_url: Option<&str>,
) -> Result<Vec<String>, ProbeError> {
    let Some(raw) = discovery_url else {
        return Ok(Vec::new());
    };
    let url = Url::parse(raw).map_err(|source| ProbeError::DiscoveryUrl {
        url: raw.to_string(),
        source,
    })?;
    let deadline = RequestDeadline::from_timeout(DISCOVERY_TIMEOUT);
    let body = transport
        .get(url.as_str(), Some(deadline))
        .map_err(|source| ProbeError::Discovery {
            url: raw.to_string(),
            source,
        })?;
    let reply: KeysReply =
        serde_json::from_slice(&body).map_err(|source| ProbeError::DiscoveryResponse {
            url: raw.to_string(),
            source,
        })?;
    let peers: Vec<String> = reply
        .node
        .nodes
        .into_iter()
        .filter(|node| {
            let base = node.key.rsplit('/').next().unwrap_or_default();
            let metadata = METADATA_KEYS.contains(&base);
            if metadata {
                debug!("skipping discovery metadata key {}", node.key);
            }
            !metadata
        })
        .map(|node| node.value)
        .collect();
    info!(
        "etcd-starter: discovery {raw} lists {} peer(s)",
        peers.len()
    );
    Ok(peers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{HttpError, NetError};
    use std::cell::Cell;

    struct Fixed {
        reply: Result<&'static str, u16>,
        saw_deadline: Cell<bool>,
    }

    impl HttpTransport for Fixed {
        fn get(&self, _url: &str, deadline: Option<RequestDeadline>) -> Result<Vec<u8>, NetError> {
            self.saw_deadline.set(deadline.is_some());
            match self.reply {
                Ok(body) => Ok(body.as_bytes().to_vec()),
                Err(status) => Err(HttpError::UnexpectedStatus { status }.into()),
            }
        }
    }

    fn fixed(reply: Result<&'static str, u16>) -> Fixed {
        Fixed {
            reply,
            saw_deadline: Cell::new(false),
        }
    }

    #[test]
    fn metadata_children_are_excluded() {
        let transport = fixed(Ok(r#"{"action":"get","node":{"key":"/_etcd/registry/abc","dir":true,"nodes":[
            {"key":"/_etcd/registry/abc/_config","dir":true},
            {"key":"/_etcd/registry/abc/_state","value":"started"},
            {"key":"/_etcd/registry/abc/node1","value":"http://10.0.0.1:7001"},
            {"key":"/_etcd/registry/abc/node2","value":"http://10.0.0.2:7001"}]}}"#));
        let peers = fetch_discovery_peers(&transport, Some("http://disc.example/abc")).unwrap();
        assert_eq!(peers, vec!["http://10.0.0.1:7001", "http://10.0.0.2:7001"]);
        assert!(transport.saw_deadline.get());
    }

    #[test]
    fn unset_discovery_yields_no_peers() {
        let transport = fixed(Err(500));
        assert!(fetch_discovery_peers(&transport, None).unwrap().is_empty());
    }

    #[test]
    fn failures_are_reported() {
        let transport = fixed(Err(404));
        assert!(matches!(
            fetch_discovery_peers(&transport, Some("http://disc.example/abc")),
            Err(ProbeError::Discovery { .. })
        ));
        let transport = fixed(Ok("<html>"));
        assert!(matches!(
            fetch_discovery_peers(&transport, Some("http://disc.example/abc")),
            Err(ProbeError::DiscoveryResponse { .. })
        ));
        assert!(matches!(
            fetch_discovery_peers(&transport, Some("not a url")),
            Err(ProbeError::DiscoveryUrl { .. })
        ));
    }
}
