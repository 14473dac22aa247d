//! Blocking HTTP(S) client used to talk to discovery services and cluster members.

use thiserror::Error;

pub mod http;
pub mod tls;

pub use http::{HttpClient, HttpTransport, RequestDeadline};
pub use tls::{
    load_identity_from_pem, load_trust_store_from_pem, public_trust_store, TlsIdentity,
    TlsTrustStore,
};

/// Errors emitted by the built-in networking helpers.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),
    #[error("certificate error: {0}")]
    Certificate(#[from] CertificateError),
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("identity certificate chain empty")]
    IdentityChainEmpty,
    #[error("failed to read trust bundle")]
    TrustBundleRead,
    #[error("trust bundle is empty")]
    TrustBundleEmpty,
    #[error("trust bundle does not contain parsable certificates")]
    TrustBundleUnparsable,
    #[error("invalid server name `{host}` for certificate")]
    InvalidServerName { host: String },
    #[error("invalid certificate chain")]
    InvalidCertificateChain,
    #[error("invalid PKCS#8 private key")]
    InvalidPkcs8Key,
    #[error("invalid RSA private key")]
    InvalidRsaKey,
    #[error("invalid SEC1 EC private key")]
    InvalidEcKey,
    #[error(
        "unsupported or missing private key material (expected PKCS#8, PKCS#1 RSA, or SEC1 EC)"
    )]
    MissingPrivateKey,
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("HTTP request timed out")]
    RequestTimeout,
    #[error("unsupported URL scheme `{scheme}` (expected http or https)")]
    UnsupportedScheme { scheme: String },
    #[error("https endpoint requested but no trust store is configured")]
    MissingTrustStore,
    #[error("TLS client configuration unavailable: {reason}")]
    TlsUnavailable { reason: String },
    #[error("URL missing host")]
    MissingHost,
    #[error("unable to resolve {target}")]
    Unresolvable { target: String },
    #[error("endpoint returned HTTP {status}")]
    UnexpectedStatus { status: u16 },
    #[error("failed to parse HTTP response")]
    ResponseParse,
    #[error("HTTP response missing status code")]
    MissingStatusCode,
    #[error("invalid Content-Length header")]
    InvalidContentLengthHeader,
    #[error("invalid chunk size in chunked body")]
    InvalidChunkSize,
    #[error("truncated HTTP body")]
    TruncatedBody,
    #[error("HTTP response exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },
}
