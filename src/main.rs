use clap::Parser;
use vi_router::cli::{run_cli, Cli};
use vi_router::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env())?;
    run_cli(cli)
}
