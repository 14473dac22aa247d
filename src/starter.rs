//! Entry points tying configuration, resolution and launch together.

use crate::config::{EnvSource, StoreConfig};
use crate::datadir::DataDirInspector;
use crate::launch::{LaunchPlan, ProcessHandoff};
use crate::net::{HttpClient, HttpTransport};
use crate::resolver::{Channels, EpochResolver};
use crate::util::StarterError;
use log::{info, warn};
use std::convert::Infallible;
use std::path::Path;

/// Collaborators one start-up needs. Production wiring uses the filesystem inspector, the
/// TLS-configured HTTP clients and `exec`.
pub struct StarterDeps<'a> {
    pub env: &'a dyn EnvSource,
    pub inspector: &'a dyn DataDirInspector,
    /// Builds the HTTP channels once the store configuration is known.
    pub transports: &'a dyn Fn(&StoreConfig) -> Transports,
}

/// Owned HTTP channels for one start-up.
pub struct Transports {
    pub client: Box<dyn HttpTransport>,
    pub peer: Box<dyn HttpTransport>,
    pub discovery: Box<dyn HttpTransport>,
}

impl Transports {
    pub fn channels(&self) -> Channels<'_> {
        Channels {
            client: self.client.as_ref(),
            peer: self.peer.as_ref(),
            discovery: self.discovery.as_ref(),
        }
    }
}

/// Parses `args`, resolves the epoch and returns the process to start.
pub fn prepare_launch(
    bin_dir: &Path,
    args: &[String],
    deps: &StarterDeps<'_>,
) -> Result<LaunchPlan, StarterError> {
    let config = StoreConfig::parse(args, deps.env)?;
    if !config.positional().is_empty() {
        warn!(
            "etcd-starter: arguments after the last flag are not flags: {:?}",
            config.positional()
        );
    }
    let transports = (deps.transports)(&config);
    let resolver = EpochResolver::new(deps.inspector, transports.channels());
    let resolution = resolver.resolve(&config);
    info!(
        "etcd-starter: starting etcd version {} (rules: {})",
        resolution.epoch,
        resolution.trail.join(" -> ")
    );
    let plan = LaunchPlan::build(bin_dir, &resolution, args)?;
    info!(
        "etcd-starter: starting with {} {:?}",
        plan.executable.display(),
        plan.args
    );
    if !plan.env_remove.is_empty() {
        info!("etcd-starter: removing {:?} from the environment", plan.env_remove);
    }
    Ok(plan)
}

/// Resolves and hands off. Returns only when something went wrong.
pub fn start_desired_version(
    bin_dir: &Path,
    args: &[String],
    deps: &StarterDeps<'_>,
    handoff: &dyn ProcessHandoff,
) -> Result<Infallible, StarterError> {
    let plan = prepare_launch(bin_dir, args, deps)?;
    Ok(handoff.hand_off(&plan)?)
}

/// HTTP channels built from the store's `ca-file`/`cert-file`/`key-file` flags and their
/// `peer-` counterparts. Discovery ignores those flags and trusts the public web PKI.
pub fn tls_transports(config: &StoreConfig) -> Transports {
    Transports {
        client: Box::new(config.client_tls().http_client()),
        peer: Box::new(config.peer_tls().http_client()),
        discovery: Box::new(HttpClient::with_public_roots()),
    }
}
