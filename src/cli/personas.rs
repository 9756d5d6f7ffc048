use crate::cli::PersonasArgs;
use crate::config::Config;
use crate::registry::ReviewerRegistry;

pub fn execute(args: PersonasArgs, config: &Config) -> anyhow::Result<()> {
    config.validate()?;
    let registry = ReviewerRegistry::from_config(config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&registry.summaries())?);
        return Ok(());
    }

    let summaries = registry.summaries();
    let width = summaries.iter().map(|s| s.id.len()).max().unwrap_or(0);
    for summary in summaries {
        let provider = registry
            .get(&summary.id)
            .map(|r| r.provider.to_string())
            .unwrap_or_default();
        println!(
            "{:width$}  {:<24} {}",
            summary.id,
            summary.label,
            provider,
            width = width
        );
    }
    Ok(())
}
