use std::fmt;

/// Internal protocol generation a node must run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Epoch {
    V1,
    V2,
    V2Proxy,
    Unknown,
}

impl Epoch {
    /// Label used by members when reporting `internalVersion`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Epoch::V1 => "1",
            Epoch::V2 => "2",
            Epoch::V2Proxy => "2.proxy",
            Epoch::Unknown => "unknown",
        }
    }

    /// Maps a reported `internalVersion`. Only members speaking `1` or `2` are understood.
    pub fn from_internal_version(value: &str) -> Option<Self> {
        match value {
            "1" => Some(Epoch::V1),
            "2" => Some(Epoch::V2),
            _ => None,
        }
    }

    /// Subdirectory of the binaries root holding the executable for this epoch.
    pub fn binary_subdir(&self) -> Option<&'static str> {
        match self {
            Epoch::V1 => Some("1"),
            Epoch::V2 | Epoch::V2Proxy => Some("2"),
            Epoch::Unknown => None,
        }
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
