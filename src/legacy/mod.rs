//! Readers for the v1 data directory layout: the standby marker, snapshots, and the command
//! log, plus the migration-intent check built on top of them.

pub mod command_log;
pub mod migration;
pub mod snapshot;
pub mod standby;
pub mod store;

pub use command_log::{decode_log_from_file, LegacyCommand, LogEntry, SET_COMMAND};
pub use migration::{find_migration_marker, MigrationMarker, MarkerSource};
pub use snapshot::{decode_latest_snapshot_from_dir, LegacySnapshot};
pub use standby::{decode_standby_marker_from_file, StandbyMarker, StandbyMember};
pub use store::{StoreNode, StoreTree};

use std::path::PathBuf;
use thiserror::Error;

/// Key under which v1 members record the protocol version the cluster agreed to move to.
pub const NEXT_INTERNAL_VERSION_KEY: &str = "/_etcd/next-internal-version";
/// Value stored under [`NEXT_INTERNAL_VERSION_KEY`] once the move to v2 is committed.
pub const MIGRATION_SENTINEL: &str = "2";

#[derive(Debug, Error)]
pub enum LegacyDecodeError {
    #[error("{path} does not exist")]
    NotFound { path: PathBuf },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("snapshot state in {path} is not base64: {source}")]
    Base64 {
        path: PathBuf,
        #[source]
        source: base64::DecodeError,
    },
    #[error("snapshot {path} checksum mismatch (expected {expected:08x}, computed {actual:08x})")]
    ChecksumMismatch {
        path: PathBuf,
        expected: u32,
        actual: u32,
    },
    #[error("invalid snapshot file name {name}")]
    SnapshotName { name: String },
    #[error("malformed frame in {path} at byte {offset}: {details}")]
    Frame {
        path: PathBuf,
        offset: u64,
        details: String,
    },
    #[error("undecodable {command} command at log index {index}: {source}")]
    Command {
        command: String,
        index: u64,
        #[source]
        source: serde_json::Error,
    },
}

impl LegacyDecodeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LegacyDecodeError::NotFound { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            LegacyDecodeError::NotFound { path }
        } else {
            LegacyDecodeError::Io { path, source }
        }
    }
}
