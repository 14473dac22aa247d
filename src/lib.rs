//! Pre-launch version selection for etcd nodes moving from the v0.4 protocol (internal
//! version 1) to v2.0 (internal version 2).
//!
//! The starter inspects the node's flags, its data directory and, when needed, the running
//! cluster, then `exec`s the matching etcd binary with any corrective flags appended.

pub mod config;
pub mod datadir;
pub mod epoch;
pub mod launch;
pub mod legacy;
pub mod net;
pub mod probe;
pub mod resolver;
pub mod starter;
pub mod util;

pub use config::{ConfigError, EnvSource, ProcessEnv, StoreConfig, TlsInfo};
pub use datadir::{DataDirInspector, DataDirState, FsDataDir};
pub use epoch::Epoch;
pub use launch::{ExecHandoff, LaunchError, LaunchPlan, ProcessHandoff};
pub use legacy::{LegacyDecodeError, MigrationMarker, StandbyMarker};
pub use net::{HttpClient, HttpTransport, NetError, RequestDeadline};
pub use probe::ProbeError;
pub use resolver::{Channels, EpochResolver, LaunchCorrection, Resolution};
pub use starter::{
    prepare_launch, start_desired_version, tls_transports, StarterDeps, Transports,
};
pub use util::StarterError;
