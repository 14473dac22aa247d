use super::ProbeError;
use crate::epoch::Epoch;
use crate::net::HttpTransport;
use log::{info, warn};
use serde::Deserialize;

#[derive(Deserialize)]
struct VersionReply {
    #[serde(rename = "internalVersion")]
    internal_version: Option<String>,
}

/// Returns the epoch reported by the first candidate that answers `GET <url>/version` with a
/// version this starter understands.
///
/// Unreachable candidates, unreadable bodies and unknown versions are logged and skipped.
pub fn probe_peer_version(
    transport: &dyn HttpTransport,
    client_urls: &[String],
) -> Result<Epoch, ProbeError> {
    for url in client_urls {
        let endpoint = format!("{}/version", url.trim_end_matches('/'));
        let body = match transport.get(&endpoint, None) {
            Ok(body) => body,
            Err(err) => {
                warn!("etcd-starter: failed to get /version from {url}: {err}");
                continue;
            }
        };
        let reply: VersionReply = match serde_json::from_slice(&body) {
            Ok(reply) => reply,
            Err(err) => {
                warn!(
                    "etcd-starter: failed to unmarshal body {} from {url}: {err}",
                    String::from_utf8_lossy(&body)
                );
                continue;
            }
        };
        let reported = reply.internal_version.unwrap_or_default();
        match Epoch::from_internal_version(&reported) {
            Some(epoch) => {
                info!("etcd-starter: {url} reports internal version {epoch}");
                return Ok(epoch);
            }
            None => warn!("etcd-starter: unrecognized internal version {reported:?} from {url}"),
        }
    }
    Err(ProbeError::Exhausted {
        urls: client_urls.to_vec(),
    })
}
