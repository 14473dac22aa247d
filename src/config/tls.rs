use crate::net::HttpClient;
use std::path::PathBuf;

/// TLS material configured for one channel (client-facing or peer-facing).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsInfo {
    pub ca_file: Option<PathBuf>,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
}

impl TlsInfo {
    /// `https` once both a certificate and a key are configured, `http` otherwise.
    pub fn scheme(&self) -> &'static str {
        if self.cert_file.is_some() && self.key_file.is_some() {
            "https"
        } else {
            "http"
        }
    }

    /// Builds the blocking client used for this channel.
    pub fn http_client(&self) -> HttpClient {
        let identity = match (&self.cert_file, &self.key_file) {
            (Some(cert), Some(key)) => Some((cert.as_path(), key.as_path())),
            _ => None,
        };
        HttpClient::from_pem_files(self.ca_file.as_deref(), identity)
    }
}
