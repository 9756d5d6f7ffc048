use crate::cli::ServeArgs;
use crate::config::Config;
use crate::runner::Orchestrator;
use crate::server::{run_serve, AppState};
use std::sync::Arc;
use tracing::info;

pub async fn execute(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    // CLI flags and env vars override the config file
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(api_key) = args.api_key.filter(|k| !k.is_empty()) {
        config.server.api_key = Some(api_key);
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    config.validate()?;

    let orchestrator = Orchestrator::from_config(&config)?;
    info!(
        "Loaded {} personas, default provider {}",
        orchestrator.registry().len(),
        config.default_provider
    );

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        api_key: config.server.api_key.clone(),
    };
    run_serve(state, &config.server.host, config.server.port).await
}
