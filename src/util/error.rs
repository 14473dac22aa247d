use crate::config::ConfigError;
use crate::launch::LaunchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StarterError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Launch(#[from] LaunchError),
}
