use super::LegacyDecodeError;
use prost::Message;
use serde::Deserialize;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Command name v1 members use for plain key writes.
pub const SET_COMMAND: &str = "etcd:set";

const LENGTH_HEADER_BYTES: usize = 9;
const MAX_ENTRY_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub index: u64,
    pub term: u64,
    pub command: LegacyCommand,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LegacyCommand {
    Set { key: String, value: String },
    /// Any other command; only its name is kept.
    Other { name: String },
}

/// Wire form of one raft log entry. `command` holds the JSON encoding of the command.
#[derive(Clone, PartialEq, Message)]
pub(crate) struct RawEntry {
    #[prost(uint64, tag = "1")]
    pub index: u64,
    #[prost(uint64, tag = "2")]
    pub term: u64,
    #[prost(string, tag = "3")]
    pub command_name: String,
    #[prost(bytes = "vec", tag = "4")]
    pub command: Vec<u8>,
}

#[derive(Deserialize)]
struct SetCommand {
    key: String,
    #[serde(default)]
    value: String,
}

/// Decodes every entry of a v1 command log, oldest first. A missing log is empty.
///
/// Each frame is a space-padded 8-digit hex length, a newline, and that many bytes of
/// protobuf-encoded entry.
pub fn decode_log_from_file(path: impl AsRef<Path>) -> Result<Vec<LogEntry>, LegacyDecodeError> {
    let path = path.as_ref();
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(LegacyDecodeError::io(path, err)),
    };
    decode_log(path, BufReader::new(file))
}

fn decode_log(path: &Path, mut reader: impl BufRead) -> Result<Vec<LogEntry>, LegacyDecodeError> {
    let mut entries = Vec::new();
    let mut offset = 0u64;
    loop {
        if reader
            .fill_buf()
            .map_err(|err| LegacyDecodeError::io(path, err))?
            .is_empty()
        {
            return Ok(entries);
        }
        let frame_err = |details: String| LegacyDecodeError::Frame {
            path: path.to_path_buf(),
            offset,
            details,
        };
        let mut header = [0u8; LENGTH_HEADER_BYTES];
        reader
            .read_exact(&mut header)
            .map_err(|_| frame_err("truncated length header".into()))?;
        if header[8] != b'\n' {
            return Err(frame_err("length header not newline terminated".into()));
        }
        let len = std::str::from_utf8(&header[..8])
            .ok()
            .and_then(|hex| usize::from_str_radix(hex.trim(), 16).ok())
            .ok_or_else(|| frame_err("length header is not hex".into()))?;
        if len > MAX_ENTRY_BYTES {
            return Err(frame_err(format!("entry length {len} exceeds limit")));
        }
        let mut payload = vec![0u8; len];
        reader
            .read_exact(&mut payload)
            .map_err(|_| frame_err(format!("truncated entry (expected {len} bytes)")))?;
        let raw =
            RawEntry::decode(payload.as_slice()).map_err(|err| frame_err(err.to_string()))?;
        entries.push(decode_entry(raw)?);
        offset += (LENGTH_HEADER_BYTES + len) as u64;
    }
}

fn decode_entry(raw: RawEntry) -> Result<LogEntry, LegacyDecodeError> {
    let command = if raw.command_name == SET_COMMAND {
        let set: SetCommand =
            serde_json::from_slice(&raw.command).map_err(|source| LegacyDecodeError::Command {
                command: raw.command_name.clone(),
                index: raw.index,
                source,
            })?;
        LegacyCommand::Set {
            key: set.key,
            value: set.value,
        }
    } else {
        LegacyCommand::Other {
            name: raw.command_name,
        }
    };
    Ok(LogEntry {
        index: raw.index,
        term: raw.term,
        command,
    })
}

#[cfg(test)]
pub(crate) fn encode_entry(out: &mut Vec<u8>, index: u64, name: &str, command: serde_json::Value) {
    let payload = RawEntry {
        index,
        term: 1,
        command_name: name.to_string(),
        command: serde_json::to_vec(&command).expect("command serializes"),
    }
    .encode_to_vec();
    out.extend_from_slice(format!("{:8x}\n", payload.len()).as_bytes());
    out.extend_from_slice(&payload);
}
