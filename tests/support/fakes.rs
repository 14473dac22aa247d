#![allow(dead_code)]

use etcd_starter::datadir::{DataDirInspector, DataDirState};
use etcd_starter::legacy::{
    LegacyCommand, LegacyDecodeError, LegacySnapshot, LogEntry, StandbyMarker, StandbyMember,
    StoreTree, MIGRATION_SENTINEL, NEXT_INTERNAL_VERSION_KEY,
};
use etcd_starter::net::{HttpError, HttpTransport, NetError, RequestDeadline};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::path::Path;

pub enum Standby {
    Missing,
    Corrupt,
    Present(StandbyMarker),
}

/// In-memory data directory. Counts classification calls so tests can assert short-circuits.
pub struct FakeDataDir {
    pub state: Result<DataDirState, io::ErrorKind>,
    pub standby: Standby,
    pub snapshot: Option<StoreTree>,
    pub log: Vec<LogEntry>,
    pub corrupt_log: bool,
    pub classify_calls: Cell<usize>,
}

impl FakeDataDir {
    pub fn new(state: DataDirState) -> Self {
        Self {
            state: Ok(state),
            standby: Standby::Missing,
            snapshot: None,
            log: Vec::new(),
            corrupt_log: false,
            classify_calls: Cell::new(0),
        }
    }

    pub fn unreadable() -> Self {
        Self {
            state: Err(io::ErrorKind::PermissionDenied),
            ..Self::new(DataDirState::Absent)
        }
    }
}

impl DataDirInspector for FakeDataDir {
    fn classify(&self, _data_dir: &Path) -> io::Result<DataDirState> {
        self.classify_calls.set(self.classify_calls.get() + 1);
        self.state.map_err(io::Error::from)
    }

    fn standby_marker(&self, data_dir: &Path) -> Result<StandbyMarker, LegacyDecodeError> {
        let path = data_dir.join("standby_info");
        match &self.standby {
            Standby::Missing => Err(LegacyDecodeError::NotFound { path }),
            Standby::Corrupt => Err(LegacyDecodeError::Json {
                path,
                source: serde_json::from_str::<StandbyMarker>("{").unwrap_err(),
            }),
            Standby::Present(marker) => Ok(marker.clone()),
        }
    }

    fn standby_marker_exists(&self, _data_dir: &Path) -> bool {
        !matches!(self.standby, Standby::Missing)
    }

    fn latest_snapshot(
        &self,
        data_dir: &Path,
    ) -> Result<Option<LegacySnapshot>, LegacyDecodeError> {
        Ok(self.snapshot.clone().map(|state| LegacySnapshot {
            path: data_dir.join("snapshot/1_10.ss"),
            term: 1,
            index: 10,
            state,
        }))
    }

    fn command_log(&self, data_dir: &Path) -> Result<Vec<LogEntry>, LegacyDecodeError> {
        if self.corrupt_log {
            return Err(LegacyDecodeError::Frame {
                path: data_dir.join("log"),
                offset: 0,
                details: "truncated length header".into(),
            });
        }
        Ok(self.log.clone())
    }
}

pub fn sentinel_set(index: u64) -> LogEntry {
    LogEntry {
        index,
        term: 1,
        command: LegacyCommand::Set {
            key: NEXT_INTERNAL_VERSION_KEY.into(),
            value: MIGRATION_SENTINEL.into(),
        },
    }
}

pub fn plain_set(index: u64, key: &str, value: &str) -> LogEntry {
    LogEntry {
        index,
        term: 1,
        command: LegacyCommand::Set {
            key: key.into(),
            value: value.into(),
        },
    }
}

pub fn running_standby(members: &[(&str, &str, &str)]) -> StandbyMarker {
    StandbyMarker {
        running: true,
        cluster: members
            .iter()
            .map(|(name, peer, client)| StandbyMember {
                name: (*name).into(),
                state: "follower".into(),
                client_url: (*client).into(),
                peer_url: (*peer).into(),
            })
            .collect(),
        sync_interval: 5.0,
    }
}

/// Answers GETs from a fixed table; anything else is a refused connection.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: HashMap<String, Result<String, u16>>,
    pub calls: RefCell<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, url: &str, body: &str) -> Self {
        self.replies.insert(url.to_string(), Ok(body.to_string()));
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.replies.insert(url.to_string(), Err(status));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl HttpTransport for ScriptedTransport {
    fn get(&self, url: &str, _deadline: Option<RequestDeadline>) -> Result<Vec<u8>, NetError> {
        self.calls.borrow_mut().push(url.to_string());
        match self.replies.get(url) {
            Some(Ok(body)) => Ok(body.clone().into_bytes()),
            Some(Err(status)) => Err(HttpError::UnexpectedStatus { status: *status }.into()),
            None => Err(NetError::Io(io::Error::from(io::ErrorKind::ConnectionRefused))),
        }
    }
}
