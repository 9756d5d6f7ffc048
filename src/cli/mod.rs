pub mod personas;
pub mod review;
pub mod schema;
pub mod serve;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "panelrev")]
#[command(
    author,
    version,
    about = "Persona panel design review: fan one screenshot out to many AI reviewers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: panelrev.yaml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API
    Serve(ServeArgs),

    /// Review a request file from the command line
    Review(ReviewArgs),

    /// List enabled personas
    Personas(PersonasArgs),

    /// Print JSON Schema for config (or feedback) validation
    Schema(SchemaArgs),
}

#[derive(Parser, Clone)]
pub struct ServeArgs {
    /// Bind address
    #[arg(long, env = "PANELREV_HOST")]
    pub host: Option<String>,

    /// Bind port
    #[arg(long, env = "PANELREV_PORT")]
    pub port: Option<u16>,

    /// Require this key in the X-API-Key header on /api routes
    #[arg(long, env = "PANELREV_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Override max simultaneous provider calls
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(Parser, Clone)]
pub struct ReviewArgs {
    /// Request JSON file, same shape as the POST /api/feedback body
    #[arg(value_name = "FILE")]
    pub request: PathBuf,

    /// Override the request's personas (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub personas: Option<Vec<String>>,

    /// Print one aggregate JSON document instead of NDJSON events
    #[arg(long)]
    pub batch: bool,

    /// Override max simultaneous provider calls
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(Parser, Clone)]
pub struct PersonasArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Clone)]
pub struct SchemaArgs {
    /// Print the reviewer feedback schema instead of the config schema
    #[arg(long)]
    pub feedback: bool,
}
