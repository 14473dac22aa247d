use super::layout::{
    CONF_FILE, LOG_FILE, MEMBER_DIR, PROXY_DIR, SNAPSHOT_DIR, SNAP_DIR, STANDBY_INFO_FILE, WAL_DIR,
};
use super::DataDirState;
use std::collections::BTreeSet;
use std::io;
use std::path::Path;

/// Layout detected on disk. Collapses to [`DataDirState`] for resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedLayout {
    NotExist,
    V1,
    V2,
    /// v2 data nested under `member/`.
    V2Member,
    V2Proxy,
    Unknown,
}

impl From<DetectedLayout> for DataDirState {
    fn from(layout: DetectedLayout) -> Self {
        match layout {
            DetectedLayout::NotExist => DataDirState::Absent,
            DetectedLayout::V1 => DataDirState::LegacyFormat,
            DetectedLayout::V2 | DetectedLayout::V2Member => DataDirState::CurrentFormat,
            DetectedLayout::V2Proxy => DataDirState::CurrentFormatProxy,
            DetectedLayout::Unknown => DataDirState::Unrecognized,
        }
    }
}

/// Detects which protocol wrote `dir` from the names it contains.
pub fn detect_layout(dir: &Path) -> io::Result<DetectedLayout> {
    let names = match list_names(dir) {
        Ok(names) => names,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(DetectedLayout::NotExist),
        Err(err) => return Err(err),
    };
    if names.is_empty() {
        return Ok(DetectedLayout::NotExist);
    }
    if names.contains(MEMBER_DIR) {
        return match detect_layout(&dir.join(MEMBER_DIR))? {
            DetectedLayout::V2 => Ok(DetectedLayout::V2Member),
            // v1 files below member/ are not something any release wrote
            DetectedLayout::V1 => Ok(DetectedLayout::Unknown),
            other => Ok(other),
        };
    }
    if names.contains(SNAP_DIR) && names.contains(WAL_DIR) && has_entries(&dir.join(WAL_DIR))? {
        return Ok(DetectedLayout::V2);
    }
    if names.contains(PROXY_DIR) {
        return Ok(DetectedLayout::V2Proxy);
    }
    if [SNAPSHOT_DIR, CONF_FILE, LOG_FILE]
        .iter()
        .all(|name| names.contains(*name))
    {
        return Ok(DetectedLayout::V1);
    }
    if names.contains(STANDBY_INFO_FILE) {
        return Ok(DetectedLayout::V1);
    }
    Ok(DetectedLayout::Unknown)
}

fn list_names(dir: &Path) -> io::Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for entry in std::fs::read_dir(dir)? {
        names.insert(entry?.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

fn has_entries(dir: &Path) -> io::Result<bool> {
    match std::fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_some()),
        Err(err) if err.kind() == io::ErrorKind::NotADirectory => Ok(false),
        Err(err) => Err(err),
    }
}
