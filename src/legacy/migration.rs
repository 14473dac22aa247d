use super::{LegacyCommand, LegacyDecodeError, MIGRATION_SENTINEL, NEXT_INTERNAL_VERSION_KEY};
use crate::datadir::DataDirInspector;
use log::debug;
use std::fmt;
use std::path::Path;

/// Durable evidence that a v1 cluster committed to moving to v2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationMarker {
    pub source: MarkerSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSource {
    Snapshot { index: u64 },
    CommandLog { index: u64 },
}

impl fmt::Display for MarkerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerSource::Snapshot { index } => write!(f, "snapshot at index {index}"),
            MarkerSource::CommandLog { index } => write!(f, "command log entry {index}"),
        }
    }
}

/// Looks for the migration sentinel in the latest snapshot, then in the command log.
///
/// One matching write is enough; the key is never written back to `1`. Decode failures are
/// returned, not absorbed.
pub fn find_migration_marker(
    inspector: &dyn DataDirInspector,
    data_dir: &Path,
) -> Result<Option<MigrationMarker>, LegacyDecodeError> {
    if let Some(snapshot) = inspector.latest_snapshot(data_dir)? {
        let committed = snapshot
            .state
            .get(NEXT_INTERNAL_VERSION_KEY)
            .is_some_and(|node| node.value == MIGRATION_SENTINEL);
        if committed {
            return Ok(Some(MigrationMarker {
                source: MarkerSource::Snapshot {
                    index: snapshot.index,
                },
            }));
        }
        debug!(
            "snapshot {} carries no migration marker",
            snapshot.path.display()
        );
    }

    let entries = inspector.command_log(data_dir)?;
    let marker = entries.iter().find_map(|entry| match &entry.command {
        LegacyCommand::Set { key, value }
            if key == NEXT_INTERNAL_VERSION_KEY && value == MIGRATION_SENTINEL =>
        {
            Some(MigrationMarker {
                source: MarkerSource::CommandLog { index: entry.index },
            })
        }
        _ => None,
    });
    if marker.is_none() {
        debug!("command log ({} entries) carries no migration marker", entries.len());
    }
    Ok(marker)
}
