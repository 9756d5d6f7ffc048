use crate::cli::SchemaArgs;
use crate::config::Config;
use crate::feedback::feedback_schema;
use schemars::schema_for;

pub fn execute(args: SchemaArgs) -> anyhow::Result<()> {
    if args.feedback {
        println!("{}", feedback_schema());
        return Ok(());
    }

    let schema = schema_for!(Config);
    let json = serde_json::to_string_pretty(&schema)?;
    println!("{}", json);
    Ok(())
}
