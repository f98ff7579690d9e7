use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod state;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = config::CliConfig::resolve(cli.config.as_deref())?;
    init_tracing(&config, cli.verbose);
    commands::run_command(cli, config)
}

/// `RUST_LOG` wins over the config file; `-v` raises the default to debug.
fn init_tracing(config: &config::CliConfig, verbose: bool) {
    let default = if verbose { "debug" } else { config.log_filter.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
