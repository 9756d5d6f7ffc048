use crate::cli::ReviewArgs;
use crate::config::Config;
use crate::feedback::FeedbackRequest;
use crate::runner::{Orchestrator, RunEvent};
use crate::server::events::json_line;
use anyhow::Context;
use futures::StreamExt;
use std::io::Write;
use tracing::{info, warn};

pub async fn execute(args: ReviewArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    config.validate()?;

    let content = std::fs::read_to_string(&args.request)
        .with_context(|| format!("Failed to read request file {:?}", args.request))?;
    let mut request: FeedbackRequest = serde_json::from_str(&content)
        .with_context(|| format!("Invalid request file {:?}", args.request))?;
    if let Some(overrides) = args.personas {
        request.personas = overrides;
    }

    let orchestrator = Orchestrator::from_config(&config)?;
    orchestrator.registry().resolve(&request.personas)?;
    let (personas, input) = request.into_parts()?;
    let run = orchestrator.prepare(&personas, input)?;
    info!("Reviewing with {} personas", run.tasks.len());

    if args.batch {
        let report = orchestrator.collect(run).await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        if report.feedback.is_empty() {
            anyhow::bail!("Every persona failed");
        }
        return Ok(());
    }

    // One JSON document per line, flushed as each persona lands
    let mut stream = orchestrator.start(run);
    let mut failures = 0;
    let mut stdout = std::io::stdout().lock();
    while let Some(event) = stream.next().await {
        if let RunEvent::Completed(completion) = &event {
            if !completion.is_success() {
                failures += 1;
            }
        }
        writeln!(stdout, "{}", json_line(event)?)?;
        stdout.flush()?;
    }

    if failures == personas.len() {
        anyhow::bail!("Every persona failed");
    }
    if failures > 0 {
        warn!("{} of {} personas failed", failures, personas.len());
    }
    Ok(())
}
