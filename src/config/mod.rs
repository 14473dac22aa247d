//! Store configuration as the starter sees it: command-line flags overlaid with `ETCD_*`
//! environment variables. Values are kept as raw strings; the starter only interprets the
//! handful it needs to pick a protocol version.

mod env;
pub mod flags;
mod tls;

pub use env::{EnvSource, ProcessEnv};
pub use tls::TlsInfo;

use flags::{
    CA_FILE, CERT_FILE, DATA_DIR, DISCOVERY, KEY_FILE, PEERS, PEER_CA_FILE, PEER_CERT_FILE,
    PEER_KEY_FILE, STORE_FLAGS, V2_ONLY_FLAGS,
};
use log::info;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("flag provided but not defined: -{name}")]
    UnknownFlag { name: String },
    #[error("flag needs an argument: -{name}")]
    MissingValue { name: String },
    #[error("bad flag syntax: {arg}")]
    BadSyntax { arg: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    values: BTreeMap<&'static str, String>,
    from_command_line: BTreeSet<&'static str>,
    positional: Vec<String>,
}

impl StoreConfig {
    /// Parses the store's arguments and fills every flag not given on the command line from
    /// its `ETCD_<NAME>` environment variable. Empty variables are ignored.
    pub fn parse(args: &[String], env: &dyn EnvSource) -> Result<Self, ConfigError> {
        let parsed = flags::parse_args(args)?;
        let mut config = StoreConfig {
            positional: parsed.positional,
            ..StoreConfig::default()
        };
        for (name, value) in parsed.values {
            config.values.insert(name, value);
            config.from_command_line.insert(name);
        }
        for spec in STORE_FLAGS {
            if config.from_command_line.contains(spec.name) {
                continue;
            }
            let key = flags::env_key(spec.name);
            if let Some(value) = env.var(&key).filter(|value| !value.is_empty()) {
                info!("etcd-starter: recognized environment variable {key}={value}");
                config.values.insert(spec.name, value);
            }
        }
        Ok(config)
    }

    /// Raw value of a flag; unset flags read as empty.
    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn is_set(&self, name: &str) -> bool {
        !self.value(name).is_empty()
    }

    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// First v2-only flag carrying a value, if any.
    pub fn v2_only_flag(&self) -> Option<&'static str> {
        V2_ONLY_FLAGS.into_iter().find(|name| self.is_set(name))
    }

    pub fn data_dir(&self) -> Option<PathBuf> {
        non_empty(self.value(DATA_DIR)).map(PathBuf::from)
    }

    pub fn discovery_url(&self) -> Option<&str> {
        non_empty(self.value(DISCOVERY))
    }

    /// The comma-separated `host:port` peer list given with `-peers`.
    pub fn static_peers(&self) -> &str {
        self.value(PEERS)
    }

    pub fn client_tls(&self) -> TlsInfo {
        self.tls_info(CA_FILE, CERT_FILE, KEY_FILE)
    }

    pub fn peer_tls(&self) -> TlsInfo {
        self.tls_info(PEER_CA_FILE, PEER_CERT_FILE, PEER_KEY_FILE)
    }

    fn tls_info(&self, ca: &str, cert: &str, key: &str) -> TlsInfo {
        TlsInfo {
            ca_file: non_empty(self.value(ca)).map(PathBuf::from),
            cert_file: non_empty(self.value(cert)).map(PathBuf::from),
            key_file: non_empty(self.value(key)).map(PathBuf::from),
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
