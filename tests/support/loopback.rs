#![allow(dead_code)]

use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use rustls::{Certificate, PrivateKey, ServerConfig, ServerConnection, StreamOwned};
use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

/// Canned `200` bodies keyed by request path; other paths get `404`.
pub type Routes = HashMap<&'static str, &'static str>;

/// Serves `connections` HTTP/1.1 requests on an ephemeral loopback port, then exits.
pub fn serve_plain(routes: Routes, connections: usize) -> (SocketAddr, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("ephemeral addr");
    let handle = thread::spawn(move || {
        for _ in 0..connections {
            let (mut stream, _) = listener.accept().expect("accept");
            answer(&mut stream, &routes);
        }
    });
    (addr, handle)
}

/// Like [`serve_plain`], but behind TLS with the given server configuration.
pub fn serve_tls(
    routes: Routes,
    connections: usize,
    config: Arc<ServerConfig>,
) -> (SocketAddr, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("ephemeral addr");
    let handle = thread::spawn(move || {
        for _ in 0..connections {
            let (stream, _) = listener.accept().expect("accept");
            let conn = ServerConnection::new(config.clone()).expect("server connection");
            let mut tls = StreamOwned::new(conn, stream);
            answer(&mut tls, &routes);
            tls.conn.send_close_notify();
            let _ = tls.flush();
        }
    });
    (addr, handle)
}

fn answer(stream: &mut impl ReadWrite, routes: &Routes) {
    let mut request = Vec::new();
    let mut buf = [0u8; 512];
    while !request.ends_with(b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    let head = String::from_utf8_lossy(&request);
    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
    let response = match routes.get(path.as_str()) {
        Some(body) => format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        ),
        None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n".to_string(),
    };
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

trait ReadWrite: Read + Write {}
impl<T: Read + Write> ReadWrite for T {}

/// PEM files for a throwaway CA, a `localhost` server leaf and a client leaf.
pub struct TlsFiles {
    pub ca: PathBuf,
    pub client_cert: PathBuf,
    pub client_key: PathBuf,
    pub server: Arc<ServerConfig>,
}

pub fn generate_tls_files(dir: &TempDir) -> Result<TlsFiles, Box<dyn Error>> {
    let ca_key = KeyPair::generate()?;
    let mut ca_params = CertificateParams::default();
    ca_params
        .distinguished_name
        .push(DnType::CommonName, "etcd-starter test ca");
    ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    let ca_cert = ca_params.self_signed(&ca_key)?;
    let ca = dir.path().join("ca.pem");
    fs::write(&ca, ca_cert.pem())?;

    let server_key = KeyPair::generate()?;
    let server_cert = CertificateParams::new(vec!["localhost".to_string()])?
        .signed_by(&server_key, &ca_cert, &ca_key)?;

    let client_key_pair = KeyPair::generate()?;
    let client_leaf = CertificateParams::new(vec!["etcd-starter".to_string()])?
        .signed_by(&client_key_pair, &ca_cert, &ca_key)?;
    let client_cert = dir.path().join("client.pem");
    let client_key = dir.path().join("client.key");
    fs::write(&client_cert, client_leaf.pem())?;
    fs::write(&client_key, client_key_pair.serialize_pem())?;

    let server = ServerConfig::builder()
        .with_safe_defaults()
        .with_no_client_auth()
        .with_single_cert(
            vec![
                Certificate(server_cert.der().to_vec()),
                Certificate(ca_cert.der().to_vec()),
            ],
            PrivateKey(server_key.serialize_der()),
        )?;
    Ok(TlsFiles {
        ca,
        client_cert,
        client_key,
        server: Arc::new(server),
    })
}

/// A port nothing listens on.
pub fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("ephemeral addr");
    drop(listener);
    addr
}
