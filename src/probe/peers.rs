use crate::net::HttpTransport;
use log::warn;

/// Expands a `-peers` list (`host:port,host:port`) into URLs using the peer channel scheme.
pub fn static_peer_urls(peers: &str, scheme: &str) -> Vec<String> {
    peers
        .split(',')
        .map(str::trim)
        .filter(|peer| !peer.is_empty())
        .map(|peer| format!("{scheme}://{peer}"))
        .collect()
}

/// Asks every peer URL for its member's client URL via `GET <peer>/etcdURL`.
///
/// Peers that cannot be reached or answer with an empty body are skipped.
pub fn resolve_client_urls(transport: &dyn HttpTransport, peer_urls: &[String]) -> Vec<String> {
    let mut client_urls = Vec::with_capacity(peer_urls.len());
    for peer in peer_urls {
        let endpoint = format!("{}/etcdURL", peer.trim_end_matches('/'));
        match transport.get(&endpoint, None) {
            Ok(body) => {
                let url = String::from_utf8_lossy(&body).trim().to_string();
                if url.is_empty() {
                    warn!("etcd-starter: empty /etcdURL reply from {peer}");
                    continue;
                }
                client_urls.push(url);
            }
            Err(err) => warn!("etcd-starter: failed to get /etcdURL from {peer}: {err}"),
        }
    }
    client_urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{NetError, RequestDeadline};

    struct EchoClientUrl;

    impl HttpTransport for EchoClientUrl {
        fn get(&self, url: &str, _deadline: Option<RequestDeadline>) -> Result<Vec<u8>, NetError> {
            match url {
                "http://10.0.0.1:7001/etcdURL" => Ok(b"http://10.0.0.1:4001\n".to_vec()),
                "http://10.0.0.3:7001/etcdURL" => Ok(Vec::new()),
                _ => Err(NetError::Io(std::io::Error::from(
                    std::io::ErrorKind::ConnectionRefused,
                ))),
            }
        }
    }

    #[test]
    fn static_peers_get_scheme_and_drop_blanks() {
        assert_eq!(
            static_peer_urls("10.0.0.1:7001, ,10.0.0.2:7001,", "https"),
            vec!["https://10.0.0.1:7001", "https://10.0.0.2:7001"]
        );
        assert!(static_peer_urls("", "http").is_empty());
    }

    #[test]
    fn unreachable_peers_are_skipped() {
        let peers = vec![
            "http://10.0.0.1:7001".to_string(),
            "http://10.0.0.2:7001".to_string(),
            "http://10.0.0.3:7001/".to_string(),
        ];
        assert_eq!(
            resolve_client_urls(&EchoClientUrl, &peers),
            vec!["http://10.0.0.1:4001"]
        );
    }
}
