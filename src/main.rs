use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod config;
mod error;
mod feedback;
mod provider;
mod registry;
mod runner;
mod server;
#[cfg(test)]
mod testing;

use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.config.as_deref())?;

    // --verbose wins, then PANELREV_LOG, then RUST_LOG, then the config file
    let filter = if cli.verbose {
        EnvFilter::new("panelrev=debug")
    } else {
        EnvFilter::try_from_env("PANELREV_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(format!("panelrev={}", config.log_level)))
    };

    // Logs go to stderr so `review` output stays machine-readable
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Review(args) => cli::review::execute(args, config).await,
        Commands::Personas(args) => cli::personas::execute(args, &config),
        Commands::Schema(args) => cli::schema::execute(args),
    }
}
