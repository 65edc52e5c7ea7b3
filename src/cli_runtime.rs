use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use treeport::remote::RemoteClient;
use treeport::store::CredentialStore;

use crate::Commands;

#[derive(Parser)]
#[command(name = "treeport")]
#[command(about = "Import local folders into a remote data hierarchy", long_about = None)]
pub(crate) struct Cli {
    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

pub(crate) fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    crate::cli_exec::handle_command(cli.command)
}

/// `RUST_LOG` wins; otherwise warnings only, or debug for this crate with `-v`.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "warn,treeport=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(crate) fn open_client() -> Result<RemoteClient> {
    let store = CredentialStore::open_default()?;
    let cfg = store.require()?;
    RemoteClient::new(&cfg)
}
