//! Decides which protocol epoch the local node must run.
//!
//! Resolution walks an ordered rule table (see [`rules`]); the first rule whose predicate holds
//! decides, either directly or by delegating to a nested table. Every input that touches the
//! filesystem is read at most once per resolution and cached in [`ResolveContext`].

mod rules;

pub use rules::{Action, Rule, LEGACY_RULES, TOP_LEVEL_RULES};

use crate::config::StoreConfig;
use crate::datadir::{DataDirInspector, DataDirState};
use crate::epoch::Epoch;
use crate::legacy::{LegacyDecodeError, StandbyMarker};
use crate::net::HttpTransport;
use log::{debug, error, info};
use std::cell::{OnceCell, RefCell};
use std::path::{Path, PathBuf};

/// Environment variable v1 nodes read their discovery token from.
pub const DISCOVERY_ENV: &str = "ETCD_DISCOVERY";

/// Adjustment to the launched process decided during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchCorrection {
    /// Append `-proxy=on`.
    ForceProxy,
    /// Append `-initial-cluster <members>`.
    InitialCluster(String),
    /// Drop a variable from the launched process's environment.
    UnsetEnv(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub epoch: Epoch,
    pub corrections: Vec<LaunchCorrection>,
    /// Names of the rules that fired, outermost first.
    pub trail: Vec<&'static str>,
}

/// Outcome of a single rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub epoch: Epoch,
    pub corrections: Vec<LaunchCorrection>,
}

impl From<Epoch> for Verdict {
    fn from(epoch: Epoch) -> Self {
        Self {
            epoch,
            corrections: Vec::new(),
        }
    }
}

/// The HTTP channels one resolution talks over.
///
/// Client URLs are reached over `client` and `/etcdURL` lookups on peer URLs go over `peer`,
/// each with the store's TLS material for that side. The discovery service gets its own
/// channel since it lives outside the cluster.
#[derive(Clone, Copy)]
pub struct Channels<'a> {
    pub client: &'a dyn HttpTransport,
    pub peer: &'a dyn HttpTransport,
    pub discovery: &'a dyn HttpTransport,
}

pub struct EpochResolver<'a> {
    inspector: &'a dyn DataDirInspector,
    channels: Channels<'a>,
}

impl<'a> EpochResolver<'a> {
    pub fn new(inspector: &'a dyn DataDirInspector, channels: Channels<'a>) -> Self {
        Self {
            inspector,
            channels,
        }
    }

    /// Resolves the epoch for `config`. Only reads state, so repeated calls against the same
    /// disk and cluster agree.
    pub fn resolve(&self, config: &StoreConfig) -> Resolution {
        let ctx = ResolveContext::new(config, self.inspector, self.channels);
        let verdict = ctx.apply(TOP_LEVEL_RULES).unwrap_or_else(|| {
            error!(
                "etcd-starter: unhandled etcd version in {}",
                ctx.data_dir_display()
            );
            Verdict::from(Epoch::Unknown)
        });
        Resolution {
            epoch: verdict.epoch,
            corrections: verdict.corrections,
            trail: ctx.trail.into_inner(),
        }
    }
}

/// Inputs of one resolution, with lazily computed and cached filesystem reads.
pub struct ResolveContext<'a> {
    pub config: &'a StoreConfig,
    pub inspector: &'a dyn DataDirInspector,
    pub channels: Channels<'a>,
    data_dir: Option<PathBuf>,
    state: OnceCell<Option<DataDirState>>,
    standby: OnceCell<Result<Option<StandbyMarker>, LegacyDecodeError>>,
    trail: RefCell<Vec<&'static str>>,
}

impl<'a> ResolveContext<'a> {
    fn new(
        config: &'a StoreConfig,
        inspector: &'a dyn DataDirInspector,
        channels: Channels<'a>,
    ) -> Self {
        Self {
            config,
            inspector,
            channels,
            data_dir: config.data_dir(),
            state: OnceCell::new(),
            standby: OnceCell::new(),
            trail: RefCell::new(Vec::new()),
        }
    }

    /// Runs `rules` in order and returns the verdict of the first that matches.
    pub fn apply(&self, rules: &[Rule]) -> Option<Verdict> {
        let rule = rules.iter().find(|rule| (rule.when)(self))?;
        debug!("etcd-starter: rule {} matched", rule.name);
        self.trail.borrow_mut().push(rule.name);
        Some(match &rule.then {
            Action::Resolve { epoch, note } => {
                info!("etcd-starter: {note}");
                Verdict::from(*epoch)
            }
            Action::Delegate(delegate) => delegate(self),
        })
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    fn data_dir_display(&self) -> String {
        self.data_dir()
            .map(|dir| dir.display().to_string())
            .unwrap_or_default()
    }

    /// Classification of the data directory; `None` when it is unset or cannot be listed.
    pub fn state(&self) -> Option<DataDirState> {
        *self.state.get_or_init(|| {
            let dir = self.data_dir()?;
            match self.inspector.classify(dir) {
                Ok(state) => {
                    info!(
                        "etcd-starter: detected {} data in {}",
                        state.as_str(),
                        dir.display()
                    );
                    Some(state)
                }
                Err(err) => {
                    error!(
                        "etcd-starter: failed to detect etcd version in {}: {err}",
                        dir.display()
                    );
                    None
                }
            }
        })
    }

    /// The decoded standby marker; a missing marker is `Ok(None)`.
    pub fn standby(&self) -> &Result<Option<StandbyMarker>, LegacyDecodeError> {
        self.standby.get_or_init(|| {
            let Some(dir) = self.data_dir() else {
                return Ok(None);
            };
            match self.inspector.standby_marker(dir) {
                Ok(marker) => Ok(Some(marker)),
                Err(err) if err.is_not_found() => Ok(None),
                Err(err) => Err(err),
            }
        })
    }
}
