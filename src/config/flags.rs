use super::ConfigError;
use log::debug;

pub const DATA_DIR: &str = "data-dir";
pub const DISCOVERY: &str = "discovery";
pub const PEERS: &str = "peers";
pub const PROXY: &str = "proxy";
pub const INITIAL_CLUSTER: &str = "initial-cluster";
pub const LISTEN_PEER_URLS: &str = "listen-peer-urls";
pub const LISTEN_CLIENT_URLS: &str = "listen-client-urls";
pub const CA_FILE: &str = "ca-file";
pub const CERT_FILE: &str = "cert-file";
pub const KEY_FILE: &str = "key-file";
pub const PEER_CA_FILE: &str = "peer-ca-file";
pub const PEER_CERT_FILE: &str = "peer-cert-file";
pub const PEER_KEY_FILE: &str = "peer-key-file";

/// Flags that only exist in the v2 protocol; setting any of them is an explicit v2 request.
pub const V2_ONLY_FLAGS: [&str; 4] = [INITIAL_CLUSTER, LISTEN_PEER_URLS, LISTEN_CLIENT_URLS, PROXY];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSpec {
    pub name: &'static str,
    /// Boolean flags may appear without a value and only accept one through `=`.
    pub boolean: bool,
}

const fn value(name: &'static str) -> FlagSpec {
    FlagSpec {
        name,
        boolean: false,
    }
}

const fn switch(name: &'static str) -> FlagSpec {
    FlagSpec {
        name,
        boolean: true,
    }
}

/// Every flag the store binaries accept. Unknown flags are configuration errors.
pub const STORE_FLAGS: &[FlagSpec] = &[
    // member
    value("name"),
    value(DATA_DIR),
    value("snapshot-count"),
    value("heartbeat-interval"),
    value("election-timeout"),
    value(LISTEN_PEER_URLS),
    value(LISTEN_CLIENT_URLS),
    value("max-snapshots"),
    value("max-wals"),
    value("cors"),
    // clustering
    value("initial-advertise-peer-urls"),
    value(INITIAL_CLUSTER),
    value("initial-cluster-state"),
    value("initial-cluster-token"),
    value("advertise-client-urls"),
    value(DISCOVERY),
    value("discovery-fallback"),
    value("discovery-proxy"),
    // proxy
    value(PROXY),
    // security
    value(CA_FILE),
    value(CERT_FILE),
    value(KEY_FILE),
    value(PEER_CA_FILE),
    value(PEER_CERT_FILE),
    value(PEER_KEY_FILE),
    // unsafe and misc
    switch("force-new-cluster"),
    switch("version"),
    // v1 flags still accepted for compatibility
    value("addr"),
    value("bind-addr"),
    value("peer-addr"),
    value("peer-bind-addr"),
    value(PEERS),
    value("peers-file"),
    switch("cluster-active-size"),
    switch("cluster-remove-delay"),
    switch("cluster-sync-interval"),
    switch("config"),
    switch("force"),
    switch("max-result-buffer"),
    switch("max-retry-attempts"),
    switch("peer-heartbeat-interval"),
    switch("peer-election-timeout"),
    switch("retry-interval"),
    switch("snapshot"),
    switch("v"),
    switch("vv"),
];

pub fn lookup(name: &str) -> Option<&'static FlagSpec> {
    STORE_FLAGS.iter().find(|spec| spec.name == name)
}

/// Environment variable consulted for a flag that was not given on the command line.
pub fn env_key(name: &str) -> String {
    format!("ETCD_{}", name.replace('-', "_").to_ascii_uppercase())
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ParsedArgs {
    pub values: Vec<(&'static str, String)>,
    pub positional: Vec<String>,
}

/// Parses arguments with Go `flag` package rules: `-name`, `--name`, `-name=value` and
/// `-name value`. Parsing stops at the first non-flag argument, at `--`, or at a help flag.
pub(crate) fn parse_args(args: &[String]) -> Result<ParsedArgs, ConfigError> {
    let mut parsed = ParsedArgs::default();
    let mut idx = 0;
    while idx < args.len() {
        let arg = &args[idx];
        idx += 1;
        if arg.len() < 2 || !arg.starts_with('-') {
            parsed.positional.extend(args[idx - 1..].iter().cloned());
            break;
        }
        let stripped = if arg.starts_with("--") {
            &arg[2..]
        } else {
            &arg[1..]
        };
        if stripped.is_empty() {
            // a bare `--` ends flag parsing
            parsed.positional.extend(args[idx..].iter().cloned());
            break;
        }
        if stripped.starts_with('-') || stripped.starts_with('=') {
            return Err(ConfigError::BadSyntax { arg: arg.clone() });
        }
        let (name, inline) = match stripped.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (stripped, None),
        };
        let Some(spec) = lookup(name) else {
            if name == "h" || name == "help" {
                debug!("help flag given; remaining arguments are passed through unparsed");
                break;
            }
            return Err(ConfigError::UnknownFlag {
                name: name.to_string(),
            });
        };
        let value = match (inline, spec.boolean) {
            (Some(value), _) => value,
            (None, true) => "true".to_string(),
            (None, false) => {
                let value = args.get(idx).ok_or_else(|| ConfigError::MissingValue {
                    name: spec.name.to_string(),
                })?;
                idx += 1;
                value.clone()
            }
        };
        parsed.values.push((spec.name, value));
    }
    Ok(parsed)
}
