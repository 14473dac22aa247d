use clap::Parser;
use env_logger::Env;
use std::io::Write;
use std::path::PathBuf;

pub const DEFAULT_BIN_DIR: &str = "/usr/libexec/etcd/internal_versions";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Starts the etcd binary matching the protocol version this node must run.
///
/// Everything after the starter's own options is handed to etcd unchanged, including
/// `-h`, `--help` and `--version`.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "etcd-starter",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// Directory holding `1/etcd` and `2/etcd`
    #[arg(long, env = "ETCD_STARTER_BIN_DIR", default_value = DEFAULT_BIN_DIR)]
    pub bin_dir: PathBuf,

    /// env_logger-style filter string (e.g. "info,etcd_starter::net=debug"); overrides RUST_LOG/defaults
    #[arg(long, env = "ETCD_STARTER_LOG")]
    pub log_filter: Option<String>,

    /// etcd flags, passed through verbatim
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub etcd_args: Vec<String>,
}

pub fn init_logging(cli_filter: Option<&str>) {
    let env = Env::default().default_filter_or(DEFAULT_LOG_FILTER);
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(filter) = cli_filter {
        builder.parse_filters(filter);
    }
    builder.format_timestamp_secs();
    builder.format(|buf, record| {
        let ts = buf.timestamp();
        writeln!(
            buf,
            "[{} {:<5} {}] {}",
            ts,
            record.level(),
            record.target(),
            record.args()
        )
    });
    builder.init();
}
