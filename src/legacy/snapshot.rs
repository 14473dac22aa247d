use super::{LegacyDecodeError, StoreTree};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const SNAPSHOT_SUFFIX: &str = ".ss";

/// The newest v1 snapshot found in a snapshot directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacySnapshot {
    pub path: PathBuf,
    pub term: u64,
    pub index: u64,
    pub state: StoreTree,
}

#[derive(Deserialize)]
struct SnapshotBody {
    #[serde(rename = "lastIndex", default)]
    last_index: u64,
    #[serde(rename = "lastTerm", default)]
    last_term: u64,
    /// Store dump as base64 of its JSON encoding.
    #[serde(default)]
    state: Option<String>,
}

/// Decodes the snapshot with the highest index in `dir`. A missing directory or one without
/// `<term>_<index>.ss` files yields `None`.
pub fn decode_latest_snapshot_from_dir(
    dir: impl AsRef<Path>,
) -> Result<Option<LegacySnapshot>, LegacyDecodeError> {
    let dir = dir.as_ref();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(LegacyDecodeError::io(dir, err)),
    };
    let mut latest: Option<(u64, u64, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(|err| LegacyDecodeError::io(dir, err))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(SNAPSHOT_SUFFIX) {
            continue;
        }
        let (term, index) = parse_snapshot_name(&name)?;
        let newer = match &latest {
            Some((best_term, best_index, _)) => (index, term) > (*best_index, *best_term),
            None => true,
        };
        if newer {
            latest = Some((term, index, entry.path()));
        }
    }
    let Some((term, index, path)) = latest else {
        debug!("no snapshot files in {}", dir.display());
        return Ok(None);
    };
    let raw = std::fs::read(&path).map_err(|err| LegacyDecodeError::io(&path, err))?;
    let body = verify_checksum(&path, &raw)?;
    let decoded: SnapshotBody =
        serde_json::from_slice(body).map_err(|source| LegacyDecodeError::Json {
            path: path.clone(),
            source,
        })?;
    let state = match decoded.state.as_deref() {
        Some(encoded) if !encoded.is_empty() => decode_state(&path, encoded)?,
        _ => StoreTree::default(),
    };
    debug!(
        "decoded snapshot {} (lastTerm {}, lastIndex {})",
        path.display(),
        decoded.last_term,
        decoded.last_index
    );
    Ok(Some(LegacySnapshot {
        path,
        term,
        index,
        state,
    }))
}

fn decode_state(path: &Path, encoded: &str) -> Result<StoreTree, LegacyDecodeError> {
    let raw = STANDARD
        .decode(encoded)
        .map_err(|source| LegacyDecodeError::Base64 {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_slice(&raw).map_err(|source| LegacyDecodeError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_snapshot_name(name: &str) -> Result<(u64, u64), LegacyDecodeError> {
    let invalid = || LegacyDecodeError::SnapshotName {
        name: name.to_string(),
    };
    let stem = name.strip_suffix(SNAPSHOT_SUFFIX).ok_or_else(invalid)?;
    let (term, index) = stem.split_once('_').ok_or_else(invalid)?;
    let term = term.parse().map_err(|_| invalid())?;
    let index = index.parse().map_err(|_| invalid())?;
    Ok((term, index))
}

/// Splits off the `%08x\n` CRC32 header and checks it against the body.
fn verify_checksum<'a>(path: &Path, raw: &'a [u8]) -> Result<&'a [u8], LegacyDecodeError> {
    let frame_err = |details: &str| LegacyDecodeError::Frame {
        path: path.to_path_buf(),
        offset: 0,
        details: details.to_string(),
    };
    if raw.len() < 9 || raw[8] != b'\n' {
        return Err(frame_err("missing checksum header"));
    }
    let header = std::str::from_utf8(&raw[..8]).map_err(|_| frame_err("checksum is not hex"))?;
    let expected = u32::from_str_radix(header, 16).map_err(|_| frame_err("checksum is not hex"))?;
    let body = &raw[9..];
    let actual = crc32fast::hash(body);
    if expected != actual {
        return Err(LegacyDecodeError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }
    Ok(body)
}
