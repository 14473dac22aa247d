use super::{CertificateError, NetError};
use rustls::{Certificate as RustlsCertificate, PrivateKey};
use rustls_pemfile::{certs, ec_private_keys, pkcs8_private_keys, rsa_private_keys};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

/// Client certificate chain and key presented to members that require mutual TLS.
#[derive(Clone)]
pub struct TlsIdentity {
    pub chain: Vec<RustlsCertificate>,
    pub private_key: PrivateKey,
}

pub fn load_identity_from_pem(
    cert_path: impl AsRef<Path>,
    key_path: impl AsRef<Path>,
) -> Result<TlsIdentity, NetError> {
    let chain = load_cert_chain(cert_path)?;
    if chain.is_empty() {
        return Err(NetError::from(CertificateError::IdentityChainEmpty));
    }
    let private_key = load_private_key(key_path)?;
    Ok(TlsIdentity { chain, private_key })
}

fn load_cert_chain(path: impl AsRef<Path>) -> Result<Vec<RustlsCertificate>, NetError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let raw = certs(&mut reader).map_err(|_| CertificateError::InvalidCertificateChain)?;
    Ok(raw.into_iter().map(RustlsCertificate).collect())
}

fn load_private_key(path: impl AsRef<Path>) -> Result<PrivateKey, NetError> {
    let pem = std::fs::read(path.as_ref())?;

    let mut reader = Cursor::new(&pem);
    let keys = pkcs8_private_keys(&mut reader).map_err(|_| CertificateError::InvalidPkcs8Key)?;
    if let Some(key) = keys.into_iter().next() {
        return Ok(PrivateKey(key));
    }

    let mut reader = Cursor::new(&pem);
    let keys = rsa_private_keys(&mut reader).map_err(|_| CertificateError::InvalidRsaKey)?;
    if let Some(key) = keys.into_iter().next() {
        return Ok(PrivateKey(key));
    }

    let mut reader = Cursor::new(&pem);
    let keys = ec_private_keys(&mut reader).map_err(|_| CertificateError::InvalidEcKey)?;
    if let Some(key) = keys.into_iter().next() {
        return Ok(PrivateKey(key));
    }

    Err(NetError::from(CertificateError::MissingPrivateKey))
}
