use super::{LaunchError, LaunchPlan};
use std::convert::Infallible;
use std::process::Command;

/// Replaces the running process with the one described by a [`LaunchPlan`].
pub trait ProcessHandoff {
    /// Returns only on failure.
    fn hand_off(&self, plan: &LaunchPlan) -> Result<Infallible, LaunchError>;
}

/// `execve(2)` with the inherited environment minus the plan's removals.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecHandoff;

impl ProcessHandoff for ExecHandoff {
    #[cfg(unix)]
    fn hand_off(&self, plan: &LaunchPlan) -> Result<Infallible, LaunchError> {
        use std::os::unix::process::CommandExt;

        let mut command = command_for(plan);
        let source = command.exec();
        Err(LaunchError::Exec {
            path: plan.executable.clone(),
            source,
        })
    }

    #[cfg(not(unix))]
    fn hand_off(&self, plan: &LaunchPlan) -> Result<Infallible, LaunchError> {
        let _ = command_for(plan);
        Err(LaunchError::Unsupported)
    }
}

fn command_for(plan: &LaunchPlan) -> Command {
    let mut command = Command::new(&plan.executable);
    command.args(&plan.args);
    for name in &plan.env_remove {
        command.env_remove(name);
    }
    command
}
