//! Inspection of a node's data directory: which protocol wrote it and what v1 artifacts it holds.

mod classify;

pub use classify::{detect_layout, DetectedLayout};

use crate::legacy::{
    decode_latest_snapshot_from_dir, decode_log_from_file, decode_standby_marker_from_file,
    LegacyDecodeError, LegacySnapshot, LogEntry, StandbyMarker,
};
use log::debug;
use std::io;
use std::path::{Path, PathBuf};

/// File and directory names found in v1 and v2 data directories.
pub mod layout {
    pub const MEMBER_DIR: &str = "member";
    pub const SNAP_DIR: &str = "snap";
    pub const WAL_DIR: &str = "wal";
    pub const PROXY_DIR: &str = "proxy";
    pub const SNAPSHOT_DIR: &str = "snapshot";
    pub const CONF_FILE: &str = "conf";
    pub const LOG_FILE: &str = "log";
    pub const STANDBY_INFO_FILE: &str = "standby_info";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirState {
    LegacyFormat,
    CurrentFormat,
    CurrentFormatProxy,
    Absent,
    Unrecognized,
}

impl DataDirState {
    pub fn as_str(self) -> &'static str {
        match self {
            DataDirState::LegacyFormat => "legacy",
            DataDirState::CurrentFormat => "current",
            DataDirState::CurrentFormatProxy => "current-proxy",
            DataDirState::Absent => "absent",
            DataDirState::Unrecognized => "unrecognized",
        }
    }
}

/// Read-only view of a data directory.
///
/// Every method takes the data directory root; implementations resolve the artifact paths
/// below it.
pub trait DataDirInspector {
    fn classify(&self, data_dir: &Path) -> io::Result<DataDirState>;

    /// Decodes the standby marker. A missing marker is [`LegacyDecodeError::NotFound`].
    fn standby_marker(&self, data_dir: &Path) -> Result<StandbyMarker, LegacyDecodeError>;

    fn standby_marker_exists(&self, data_dir: &Path) -> bool;

    fn latest_snapshot(&self, data_dir: &Path)
        -> Result<Option<LegacySnapshot>, LegacyDecodeError>;

    fn command_log(&self, data_dir: &Path) -> Result<Vec<LogEntry>, LegacyDecodeError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsDataDir;

impl FsDataDir {
    pub fn standby_marker_path(data_dir: &Path) -> PathBuf {
        data_dir.join(layout::STANDBY_INFO_FILE)
    }

    pub fn snapshot_dir(data_dir: &Path) -> PathBuf {
        data_dir.join(layout::SNAPSHOT_DIR)
    }

    pub fn command_log_path(data_dir: &Path) -> PathBuf {
        data_dir.join(layout::LOG_FILE)
    }
}

impl DataDirInspector for FsDataDir {
    fn classify(&self, data_dir: &Path) -> io::Result<DataDirState> {
        let layout = detect_layout(data_dir)?;
        debug!("data dir {} has layout {:?}", data_dir.display(), layout);
        Ok(layout.into())
    }

    fn standby_marker(&self, data_dir: &Path) -> Result<StandbyMarker, LegacyDecodeError> {
        decode_standby_marker_from_file(Self::standby_marker_path(data_dir))
    }

    fn standby_marker_exists(&self, data_dir: &Path) -> bool {
        Self::standby_marker_path(data_dir).exists()
    }

    fn latest_snapshot(
        &self,
        data_dir: &Path,
    ) -> Result<Option<LegacySnapshot>, LegacyDecodeError> {
        decode_latest_snapshot_from_dir(Self::snapshot_dir(data_dir))
    }

    fn command_log(&self, data_dir: &Path) -> Result<Vec<LogEntry>, LegacyDecodeError> {
        decode_log_from_file(Self::command_log_path(data_dir))
    }
}
