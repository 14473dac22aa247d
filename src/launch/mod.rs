//! Turns a resolved epoch into the concrete process to start.

mod exec;

pub use exec::{ExecHandoff, ProcessHandoff};

use crate::epoch::Epoch;
use crate::resolver::{LaunchCorrection, Resolution};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the store executable inside each epoch's subdirectory.
pub const EXECUTABLE_NAME: &str = "etcd";
pub const PROXY_ON_FLAG: &str = "-proxy=on";
pub const INITIAL_CLUSTER_FLAG: &str = "-initial-cluster";

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("no etcd version could be resolved; refusing to start")]
    UnresolvedEpoch,
    #[error("failed to execute {path}: {source}")]
    Exec {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("process replacement is not supported on this platform")]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub epoch: Epoch,
    pub executable: PathBuf,
    /// Arguments after the program name.
    pub args: Vec<String>,
    /// Variables removed from the inherited environment.
    pub env_remove: Vec<String>,
}

impl LaunchPlan {
    /// Builds the plan for `resolution`, appending its corrections to `args`.
    pub fn build(
        bin_dir: &Path,
        resolution: &Resolution,
        args: &[String],
    ) -> Result<Self, LaunchError> {
        let subdir = resolution
            .epoch
            .binary_subdir()
            .ok_or(LaunchError::UnresolvedEpoch)?;
        let mut plan = LaunchPlan {
            epoch: resolution.epoch,
            executable: bin_dir.join(subdir).join(EXECUTABLE_NAME),
            args: args.to_vec(),
            env_remove: Vec::new(),
        };
        let mut proxy_forced = false;
        for correction in &resolution.corrections {
            match correction {
                LaunchCorrection::ForceProxy => proxy_forced = true,
                LaunchCorrection::InitialCluster(members) => {
                    plan.args.push(INITIAL_CLUSTER_FLAG.to_string());
                    plan.args.push(members.clone());
                }
                LaunchCorrection::UnsetEnv(name) => {
                    if !plan.env_remove.contains(name) {
                        plan.env_remove.push(name.clone());
                    }
                }
            }
        }
        if proxy_forced || plan.epoch == Epoch::V2Proxy {
            plan.args.push(PROXY_ON_FLAG.to_string());
        }
        Ok(plan)
    }

    /// `argv` as the new process sees it, program name first.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.executable.display().to_string())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolution(epoch: Epoch, corrections: Vec<LaunchCorrection>) -> Resolution {
        Resolution {
            epoch,
            corrections,
            trail: Vec::new(),
        }
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn executable_follows_epoch() {
        let bin = Path::new("/usr/libexec/etcd/internal_versions");
        let v1 = LaunchPlan::build(bin, &resolution(Epoch::V1, vec![]), &args(&["-name", "a"]))
            .unwrap();
        assert_eq!(v1.executable, bin.join("1").join("etcd"));
        assert_eq!(v1.args, args(&["-name", "a"]));
        let v2 = LaunchPlan::build(bin, &resolution(Epoch::V2, vec![]), &[]).unwrap();
        assert_eq!(v2.executable, bin.join("2").join("etcd"));
        assert!(v2.args.is_empty());
    }

    #[test]
    fn proxy_flag_is_added_once() {
        let bin = Path::new("/bin");
        let forced = LaunchPlan::build(
            bin,
            &resolution(Epoch::V2Proxy, vec![LaunchCorrection::ForceProxy]),
            &args(&["-data-dir", "/var/lib/etcd"]),
        )
        .unwrap();
        assert_eq!(forced.args, args(&["-data-dir", "/var/lib/etcd", "-proxy=on"]));
        let implied = LaunchPlan::build(bin, &resolution(Epoch::V2Proxy, vec![]), &[]).unwrap();
        assert_eq!(implied.args, args(&["-proxy=on"]));
    }

    #[test]
    fn standby_corrections_are_applied() {
        let plan = LaunchPlan::build(
            Path::new("/bin"),
            &resolution(
                Epoch::V2Proxy,
                vec![
                    LaunchCorrection::UnsetEnv("ETCD_DISCOVERY".into()),
                    LaunchCorrection::InitialCluster("a=http://a:7001".into()),
                    LaunchCorrection::ForceProxy,
                ],
            ),
            &args(&["-data-dir", "d"]),
        )
        .unwrap();
        assert_eq!(
            plan.args,
            args(&["-data-dir", "d", "-initial-cluster", "a=http://a:7001", "-proxy=on"])
        );
        assert_eq!(plan.env_remove, vec!["ETCD_DISCOVERY".to_string()]);
        assert_eq!(plan.argv()[0], "/bin/2/etcd");
    }

    #[test]
    fn unknown_epoch_is_refused() {
        let err = LaunchPlan::build(Path::new("/bin"), &resolution(Epoch::Unknown, vec![]), &[])
            .expect_err("unknown");
        assert!(matches!(err, LaunchError::UnresolvedEpoch));
    }
}
