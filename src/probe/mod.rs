//! Asks the running cluster which protocol version it speaks.

mod discovery;
mod peers;
mod version;

pub use discovery::{fetch_discovery_peers, DISCOVERY_TIMEOUT};
pub use peers::{resolve_client_urls, static_peer_urls};
pub use version::probe_peer_version;

use crate::net::NetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to get version from urls {urls:?}")]
    Exhausted { urls: Vec<String> },
    #[error("invalid discovery url {url}: {source}")]
    DiscoveryUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("discovery lookup at {url} failed: {source}")]
    Discovery {
        url: String,
        #[source]
        source: NetError,
    },
    #[error("malformed discovery response from {url}: {source}")]
    DiscoveryResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}
