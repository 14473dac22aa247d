mod cli;

use crate::cli::{init_logging, Cli};
use anyhow::{Context, Result};
use clap::Parser;
use etcd_starter::{
    start_desired_version, tls_transports, ExecHandoff, FsDataDir, ProcessEnv, StarterDeps,
};
use log::error;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_filter.as_deref());
    if let Err(err) = run(&cli) {
        error!("etcd-starter: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let deps = StarterDeps {
        env: &ProcessEnv,
        inspector: &FsDataDir,
        transports: &tls_transports,
    };
    let never = start_desired_version(&cli.bin_dir, &cli.etcd_args, &deps, &ExecHandoff)
        .context("failed to start etcd")?;
    match never {}
}
