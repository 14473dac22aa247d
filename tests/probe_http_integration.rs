#[path = "support/loopback.rs"]
mod loopback;

use etcd_starter::net::{HttpError, NetError};
use etcd_starter::probe::{fetch_discovery_peers, probe_peer_version, resolve_client_urls};
use etcd_starter::{
    tls_transports, Epoch, HttpClient, HttpTransport, ProbeError, StoreConfig, TlsInfo,
};
use std::collections::HashMap;
use loopback::{closed_port, generate_tls_files, serve_plain, serve_tls, Routes};
use std::error::Error;
use tempfile::TempDir;

#[test]
fn version_probe_skips_unreachable_members() -> Result<(), Box<dyn Error>> {
    let routes = Routes::from([("/version", r#"{"releaseVersion":"2.0.0","internalVersion":"2"}"#)]);
    let (addr, server) = serve_plain(routes, 1);
    let down = closed_port();
    let client = HttpClient::plain();
    let epoch = probe_peer_version(
        &client,
        &[format!("http://{down}"), format!("http://{addr}")],
    )?;
    assert_eq!(epoch, Epoch::V2);
    server.join().expect("server thread");
    Ok(())
}

#[test]
fn exhausted_probe_lists_candidates() {
    let down = closed_port();
    let candidates = vec![format!("http://{down}"), "http://[::1]:1".to_string()];
    let err = probe_peer_version(&HttpClient::plain(), &candidates).expect_err("exhausted");
    match err {
        ProbeError::Exhausted { urls } => assert_eq!(urls, candidates),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn peer_urls_resolve_to_client_urls_over_http() {
    let (addr, server) = serve_plain(Routes::from([("/etcdURL", "http://10.0.0.9:4001")]), 2);
    let peers = vec![format!("http://{addr}"), format!("http://{addr}/")];
    let client_urls = resolve_client_urls(&HttpClient::plain(), &peers);
    assert_eq!(client_urls, vec!["http://10.0.0.9:4001"; 2]);
    server.join().expect("server thread");
}

#[test]
fn discovery_lists_registered_peers() -> Result<(), Box<dyn Error>> {
    let routes = Routes::from([(
        "/_etcd/registry/token",
        r#"{"action":"get","node":{"key":"/_etcd/registry/token","dir":true,"nodes":[
            {"key":"/_etcd/registry/token/_state","value":"started"},
            {"key":"/_etcd/registry/token/7c1d","value":"http://10.0.0.1:7001"}]}}"#,
    )]);
    let (addr, server) = serve_plain(routes, 1);
    let peers = fetch_discovery_peers(
        &HttpClient::plain(),
        Some(&format!("http://{addr}/_etcd/registry/token")),
    )?;
    assert_eq!(peers, vec!["http://10.0.0.1:7001"]);
    server.join().expect("server thread");
    Ok(())
}

#[test]
fn https_members_are_probed_with_configured_tls() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let files = generate_tls_files(&dir)?;
    let (addr, server) = serve_tls(
        Routes::from([("/version", r#"{"internalVersion":"1"}"#)]),
        1,
        files.server.clone(),
    );
    let tls = TlsInfo {
        ca_file: Some(files.ca.clone()),
        cert_file: Some(files.client_cert.clone()),
        key_file: Some(files.client_key.clone()),
    };
    assert_eq!(tls.scheme(), "https");
    let client = tls.http_client();
    let epoch = probe_peer_version(&client, &[format!("https://localhost:{}", addr.port())])?;
    assert_eq!(epoch, Epoch::V1);
    server.join().expect("server thread");
    Ok(())
}

#[test]
fn https_without_ca_is_refused_before_connecting() {
    let down = closed_port();
    let err = HttpClient::plain()
        .get(&format!("https://localhost:{}/version", down.port()), None)
        .expect_err("no trust store");
    assert!(matches!(
        err,
        NetError::Http(HttpError::MissingTrustStore)
    ));
}

#[test]
fn https_discovery_does_not_need_a_configured_ca() {
    let down = closed_port();
    let discovery_url = format!("https://localhost:{}/abc", down.port());
    let config = StoreConfig::parse(
        &["-discovery".to_string(), discovery_url.clone()],
        &HashMap::<String, String>::new(),
    )
    .expect("config");
    let transports = tls_transports(&config);

    let err = transports
        .client
        .get(&discovery_url, None)
        .expect_err("client channel has no trust store");
    assert!(matches!(err, NetError::Http(HttpError::MissingTrustStore)));

    let err = transports
        .discovery
        .get(&discovery_url, None)
        .expect_err("nothing listens");
    assert!(matches!(err, NetError::Io(_)), "unexpected error: {err}");
}

#[test]
fn discovery_channel_rejects_private_certificate_authorities() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let files = generate_tls_files(&dir)?;
    let (addr, server) = serve_tls(Routes::new(), 1, files.server.clone());
    let err = HttpClient::with_public_roots()
        .get(&format!("https://localhost:{}/abc", addr.port()), None)
        .expect_err("untrusted issuer");
    assert!(!matches!(err, NetError::Http(HttpError::MissingTrustStore)));
    server.join().expect("server thread");
    Ok(())
}
