use super::deadline::RequestDeadline;
use super::response::{parse_response, MAX_RESPONSE_BYTES};
use crate::net::tls::{
    client_config, load_identity_from_pem, load_trust_store_from_pem, public_trust_store,
    server_name,
};
use crate::net::{HttpError, NetError};
use log::{debug, warn};
use rustls::{ClientConfig, ClientConnection, Stream};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use url::{Host, Url};

/// Issues a single `GET` and returns the body of a `200` response.
///
/// This is the seam between the decision logic and the network; tests substitute canned
/// transports.
pub trait HttpTransport {
    fn get(&self, url: &str, deadline: Option<RequestDeadline>) -> Result<Vec<u8>, NetError>;
}

enum TlsSetup {
    Disabled,
    Ready(Arc<ClientConfig>),
    Failed(String),
}

/// Blocking HTTP/1.1 client speaking plain HTTP or HTTPS over rustls, one connection per
/// request.
pub struct HttpClient {
    tls: TlsSetup,
}

impl HttpClient {
    /// A client that only speaks plain HTTP; `https` URLs fail with `MissingTrustStore`.
    pub fn plain() -> Self {
        Self {
            tls: TlsSetup::Disabled,
        }
    }

    pub fn with_tls(config: ClientConfig) -> Self {
        Self {
            tls: TlsSetup::Ready(Arc::new(config)),
        }
    }

    /// A client that verifies `https` servers against the public web PKI and presents no
    /// client certificate. Used for discovery services, which sit outside the cluster's CA.
    pub fn with_public_roots() -> Self {
        match client_config(&public_trust_store(), None) {
            Ok(config) => Self::with_tls(config),
            Err(err) => Self {
                tls: TlsSetup::Failed(err.to_string()),
            },
        }
    }

    /// Builds a client from PEM material. Loading failures do not abort: they are logged and
    /// every later `https` request reports them.
    pub fn from_pem_files(ca_file: Option<&Path>, identity: Option<(&Path, &Path)>) -> Self {
        let Some(ca_file) = ca_file else {
            if identity.is_some() {
                debug!("client certificate configured without a CA bundle; https disabled");
            }
            return Self::plain();
        };
        let loaded = load_trust_store_from_pem(ca_file).and_then(|trust| {
            let identity = identity
                .map(|(cert, key)| load_identity_from_pem(cert, key))
                .transpose()?;
            client_config(&trust, identity.as_ref())
        });
        match loaded {
            Ok(config) => Self::with_tls(config),
            Err(err) => {
                warn!(
                    "etcd-starter: failed to load TLS material from {}: {err}",
                    ca_file.display()
                );
                Self {
                    tls: TlsSetup::Failed(err.to_string()),
                }
            }
        }
    }

    fn tls_config(&self) -> Result<Arc<ClientConfig>, NetError> {
        match &self.tls {
            TlsSetup::Ready(config) => Ok(config.clone()),
            TlsSetup::Disabled => Err(NetError::from(HttpError::MissingTrustStore)),
            TlsSetup::Failed(reason) => Err(NetError::from(HttpError::TlsUnavailable {
                reason: reason.clone(),
            })),
        }
    }

    fn execute_get(
        &self,
        url: &Url,
        deadline: Option<RequestDeadline>,
    ) -> Result<Vec<u8>, NetError> {
        let secure = match url.scheme() {
            "http" => false,
            "https" => true,
            other => {
                return Err(NetError::from(HttpError::UnsupportedScheme {
                    scheme: other.to_string(),
                }))
            }
        };
        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => return Err(NetError::from(HttpError::MissingHost)),
        };
        let authority = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(NetError::from(HttpError::MissingHost)),
        };
        let tls = if secure {
            Some((self.tls_config()?, server_name(&host)?))
        } else {
            None
        };
        let addrs = resolve_addrs(url, &authority, deadline)?;
        let stream = connect(&addrs, &authority, deadline)?;
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\nAccept: application/json\r\nUser-Agent: etcd-starter\r\nConnection: close\r\n\r\n",
            request_target(url),
            authority
        );
        let mut io = DeadlineStream {
            inner: &stream,
            deadline,
        };
        let raw = match tls {
            Some((config, name)) => {
                let mut conn = ClientConnection::new(config, name)?;
                let mut tls = Stream::new(&mut conn, &mut io);
                exchange(&mut tls, request.as_bytes())?
            }
            None => exchange(&mut io, request.as_bytes())?,
        };
        let response = parse_response(&raw)?;
        if response.status != 200 {
            return Err(NetError::from(HttpError::UnexpectedStatus {
                status: response.status,
            }));
        }
        Ok(response.body)
    }
}

impl HttpTransport for HttpClient {
    fn get(&self, url: &str, deadline: Option<RequestDeadline>) -> Result<Vec<u8>, NetError> {
        let url = Url::parse(url)?;
        self.execute_get(&url, deadline)
    }
}

/// Resolves the URL's host. With a deadline the lookup runs on a helper thread so a slow
/// resolver cannot outlast the remaining budget; an abandoned lookup finishes in the
/// background.
fn resolve_addrs(
    url: &Url,
    target: &str,
    deadline: Option<RequestDeadline>,
) -> Result<Vec<SocketAddr>, NetError> {
    let Some(deadline) = deadline else {
        return Ok(url.socket_addrs(|| None)?);
    };
    let budget = deadline.budget()?;
    let (tx, rx) = mpsc::channel();
    let lookup = url.clone();
    thread::spawn(move || {
        let _ = tx.send(lookup.socket_addrs(|| None));
    });
    match rx.recv_timeout(budget) {
        Ok(resolved) => Ok(resolved?),
        Err(RecvTimeoutError::Timeout) => Err(NetError::from(HttpError::RequestTimeout)),
        Err(RecvTimeoutError::Disconnected) => Err(NetError::from(HttpError::Unresolvable {
            target: target.to_string(),
        })),
    }
}

fn connect(
    addrs: &[SocketAddr],
    target: &str,
    deadline: Option<RequestDeadline>,
) -> Result<TcpStream, NetError> {
    let mut last_err = None;
    for addr in addrs {
        let attempt = match deadline {
            Some(deadline) => TcpStream::connect_timeout(addr, deadline.budget()?),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(err) => last_err = Some(err),
        }
    }
    match last_err {
        Some(err) => Err(map_io_error(err)),
        None => Err(NetError::from(HttpError::Unresolvable {
            target: target.to_string(),
        })),
    }
}

fn request_target(url: &Url) -> String {
    let mut target = url.path().to_string();
    if target.is_empty() {
        target.push('/');
    }
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }
    target
}

fn exchange(stream: &mut impl ReadWrite, request: &[u8]) -> Result<Vec<u8>, NetError> {
    stream.write_all(request).map_err(map_io_error)?;
    stream.flush().map_err(map_io_error)?;
    let mut response = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                response.extend_from_slice(&buf[..n]);
                if response.len() > MAX_RESPONSE_BYTES {
                    return Err(NetError::from(HttpError::ResponseTooLarge {
                        limit: MAX_RESPONSE_BYTES,
                    }));
                }
            }
            // Servers commonly close without a TLS close_notify once the body is sent.
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof && !response.is_empty() => {
                break
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(map_io_error(err)),
        }
    }
    Ok(response)
}

trait ReadWrite: Read + Write {}

impl<T: Read + Write> ReadWrite for T {}

/// Socket wrapper that shrinks read/write timeouts to whatever is left of the deadline.
struct DeadlineStream<'a> {
    inner: &'a TcpStream,
    deadline: Option<RequestDeadline>,
}

impl DeadlineStream<'_> {
    fn arm_read(&self) -> io::Result<()> {
        if let Some(deadline) = self.deadline {
            let budget = deadline.budget().map_err(expired)?;
            self.inner.set_read_timeout(Some(budget))?;
        }
        Ok(())
    }

    fn arm_write(&self) -> io::Result<()> {
        if let Some(deadline) = self.deadline {
            let budget = deadline.budget().map_err(expired)?;
            self.inner.set_write_timeout(Some(budget))?;
        }
        Ok(())
    }
}

impl Read for DeadlineStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.arm_read()?;
        let mut inner = self.inner;
        inner.read(buf)
    }
}

impl Write for DeadlineStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.arm_write()?;
        let mut inner = self.inner;
        inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut inner = self.inner;
        inner.flush()
    }
}

fn expired(_: NetError) -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "request deadline exceeded")
}

fn map_io_error(err: io::Error) -> NetError {
    if is_timeout(&err) {
        NetError::from(HttpError::RequestTimeout)
    } else {
        NetError::from(err)
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
