mod identity;
mod trust;

pub use identity::{load_identity_from_pem, TlsIdentity};
pub use trust::{load_trust_store_from_pem, public_trust_store, TlsTrustStore};

use super::{CertificateError, NetError};
use rustls::client::ServerName;
use rustls::ClientConfig;
use std::convert::TryFrom;

/// Builds a client configuration that verifies servers against `trust` and, when an identity
/// is supplied, presents it for mutual TLS.
pub fn client_config(
    trust: &TlsTrustStore,
    identity: Option<&TlsIdentity>,
) -> Result<ClientConfig, NetError> {
    let builder = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(trust.roots.clone());
    match identity {
        Some(identity) => builder
            .with_client_auth_cert(identity.chain.clone(), identity.private_key.clone())
            .map_err(NetError::from),
        None => Ok(builder.with_no_client_auth()),
    }
}

pub fn server_name(host: &str) -> Result<ServerName, NetError> {
    ServerName::try_from(host).map_err(|_| {
        NetError::from(CertificateError::InvalidServerName {
            host: host.to_string(),
        })
    })
}
