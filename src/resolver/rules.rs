use super::{LaunchCorrection, ResolveContext, Verdict, DISCOVERY_ENV};
use crate::datadir::DataDirState;
use crate::epoch::Epoch;
use crate::legacy::find_migration_marker;
use crate::probe::{
    fetch_discovery_peers, probe_peer_version, resolve_client_urls, static_peer_urls,
};
use log::{info, warn};

pub struct Rule {
    pub name: &'static str,
    pub when: fn(&ResolveContext<'_>) -> bool,
    pub then: Action,
}

pub enum Action {
    /// Settle on a fixed epoch, logging `note`.
    Resolve { epoch: Epoch, note: &'static str },
    /// Hand the decision to a function, usually one that runs a nested table.
    Delegate(fn(&ResolveContext<'_>) -> Verdict),
}

pub static TOP_LEVEL_RULES: &[Rule] = &[
    Rule {
        name: "explicit-v2-flag",
        when: |ctx| ctx.config.v2_only_flag().is_some(),
        then: Action::Delegate(explicit_v2_flag),
    },
    Rule {
        name: "no-data-dir",
        when: |ctx| ctx.data_dir().is_none(),
        then: Action::Resolve {
            epoch: Epoch::V2,
            note: "data-dir is not set",
        },
    },
    Rule {
        name: "classification-failed",
        when: |ctx| ctx.state().is_none(),
        then: Action::Resolve {
            epoch: Epoch::Unknown,
            note: "data-dir could not be classified",
        },
    },
    Rule {
        name: "current-format",
        when: |ctx| ctx.state() == Some(DataDirState::CurrentFormat),
        then: Action::Resolve {
            epoch: Epoch::V2,
            note: "data-dir holds v2 data",
        },
    },
    Rule {
        name: "current-format-proxy",
        when: |ctx| ctx.state() == Some(DataDirState::CurrentFormatProxy),
        then: Action::Delegate(current_format_proxy),
    },
    Rule {
        name: "legacy-format",
        when: |ctx| ctx.state() == Some(DataDirState::LegacyFormat),
        then: Action::Delegate(legacy_format),
    },
    Rule {
        name: "absent",
        when: |ctx| ctx.state() == Some(DataDirState::Absent),
        then: Action::Delegate(ask_cluster),
    },
    Rule {
        name: "unrecognized",
        when: |ctx| ctx.state() == Some(DataDirState::Unrecognized),
        then: Action::Resolve {
            epoch: Epoch::V2,
            note: "unrecognized contents in data-dir, starting v2",
        },
    },
];

pub static LEGACY_RULES: &[Rule] = &[
    Rule {
        name: "standby-unreadable",
        when: |ctx| ctx.standby().is_err(),
        then: Action::Delegate(standby_unreadable),
    },
    Rule {
        name: "standby-running",
        when: |ctx| matches!(ctx.standby(), Ok(Some(marker)) if marker.running),
        then: Action::Delegate(standby_running),
    },
    Rule {
        name: "migration-check",
        when: |_| true,
        then: Action::Delegate(migration_check),
    },
];

fn explicit_v2_flag(ctx: &ResolveContext<'_>) -> Verdict {
    if let Some(flag) = ctx.config.v2_only_flag() {
        info!("etcd-starter: -{flag} is set, starting v2");
    }
    Verdict::from(Epoch::V2)
}

fn current_format_proxy(ctx: &ResolveContext<'_>) -> Verdict {
    warn_if_standby_marker_remains(ctx);
    Verdict {
        epoch: Epoch::V2Proxy,
        corrections: vec![LaunchCorrection::ForceProxy],
    }
}

fn legacy_format(ctx: &ResolveContext<'_>) -> Verdict {
    ctx.apply(LEGACY_RULES)
        .unwrap_or_else(|| Verdict::from(Epoch::V1))
}

fn standby_unreadable(ctx: &ResolveContext<'_>) -> Verdict {
    if let Err(err) = ctx.standby() {
        warn!("etcd-starter: failed to decode standby_info: {err}");
    }
    Verdict::from(Epoch::V1)
}

fn standby_running(ctx: &ResolveContext<'_>) -> Verdict {
    let Ok(Some(marker)) = ctx.standby() else {
        return Verdict::from(Epoch::V1);
    };
    match probe_peer_version(ctx.channels.client, &marker.client_urls()) {
        Ok(Epoch::V2) => {
            info!("etcd-starter: cluster moved to v2, starting standby node as v2 proxy");
            warn_if_standby_marker_remains(ctx);
            Verdict {
                epoch: Epoch::V2Proxy,
                corrections: vec![
                    LaunchCorrection::UnsetEnv(DISCOVERY_ENV.to_string()),
                    LaunchCorrection::InitialCluster(marker.initial_cluster()),
                    LaunchCorrection::ForceProxy,
                ],
            }
        }
        Ok(epoch) => Verdict::from(epoch),
        Err(err) => {
            warn!("etcd-starter: failed to check start version through peers: {err}");
            Verdict::from(Epoch::V1)
        }
    }
}

fn migration_check(ctx: &ResolveContext<'_>) -> Verdict {
    let Some(dir) = ctx.data_dir() else {
        return Verdict::from(Epoch::V1);
    };
    match find_migration_marker(ctx.inspector, dir) {
        Ok(Some(marker)) => {
            info!(
                "etcd-starter: found migration marker in {}",
                marker.source
            );
            Verdict::from(Epoch::V2)
        }
        Ok(None) => Verdict::from(Epoch::V1),
        Err(err) => {
            warn!(
                "etcd-starter: failed to check start version in {}: {err}",
                dir.display()
            );
            Verdict::from(Epoch::V1)
        }
    }
}

fn ask_cluster(ctx: &ResolveContext<'_>) -> Verdict {
    let discovery = ctx.config.discovery_url();
    let mut peers =
        fetch_discovery_peers(ctx.channels.discovery, discovery).unwrap_or_else(|err| {
            warn!("etcd-starter: failed to get peers from discovery: {err}");
            Vec::new()
        });
    peers.extend(static_peer_urls(
        ctx.config.static_peers(),
        ctx.config.peer_tls().scheme(),
    ));
    if peers.is_empty() {
        info!("etcd-starter: no peers to ask, starting v2");
        return Verdict::from(Epoch::V2);
    }
    let client_urls = resolve_client_urls(ctx.channels.peer, &peers);
    match probe_peer_version(ctx.channels.client, &client_urls) {
        Ok(epoch) => Verdict::from(epoch),
        Err(err) => {
            warn!("etcd-starter: failed to check start version through peers: {err}");
            Verdict::from(Epoch::V2)
        }
    }
}

fn warn_if_standby_marker_remains(ctx: &ResolveContext<'_>) {
    let Some(dir) = ctx.data_dir() else {
        return;
    };
    if ctx.inspector.standby_marker_exists(dir) {
        warn!("etcd-starter: detected standby_info file, adding -proxy=on to run as v2 proxy");
        warn!("etcd-starter: before removing v0.4 data, -proxy=on MUST be added to the configuration");
    }
}
