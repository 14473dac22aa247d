use super::{CertificateError, NetError};
use log::debug;
use rustls::{OwnedTrustAnchor, RootCertStore};
use rustls_pemfile::certs;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Clone)]
pub struct TlsTrustStore {
    pub roots: RootCertStore,
}

pub fn load_trust_store_from_pem(path: impl AsRef<Path>) -> Result<TlsTrustStore, NetError> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let raw = certs(&mut reader).map_err(|_| CertificateError::TrustBundleRead)?;
    if raw.is_empty() {
        return Err(NetError::from(CertificateError::TrustBundleEmpty));
    }
    let mut store = RootCertStore::empty();
    let (added, skipped) = store.add_parsable_certificates(&raw);
    if added == 0 {
        return Err(NetError::from(CertificateError::TrustBundleUnparsable));
    }
    debug!(
        "loaded {added} trust anchors from {} ({skipped} skipped)",
        path.display()
    );
    Ok(TlsTrustStore { roots: store })
}

/// Trust anchors of the public web PKI, for services reached without a configured CA bundle.
pub fn public_trust_store() -> TlsTrustStore {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.iter().map(|anchor| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    }));
    TlsTrustStore { roots }
}
