use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Persona '{0}' is defined more than once")]
    DuplicatePersona(String),

    #[error("No personas enabled")]
    NoPersonasEnabled,

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Process failed with exit code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}

/// Provider output that does not satisfy the feedback contract.
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("No JSON object found in provider output")]
    NoJson,

    #[error("Output does not match feedback schema: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid feedback: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Provide either 'image'+'metadata' or 'frames'")]
    MissingFrames,

    #[error("Frame {index} image is not valid base64: {source}")]
    InvalidBase64 {
        index: usize,
        #[source]
        source: base64::DecodeError,
    },

    #[error("Frame {0} image is empty")]
    EmptyImage(usize),

    #[error("Frame {index} image could not be downscaled: {source}")]
    UnreadableImage {
        index: usize,
        #[source]
        source: image::ImageError,
    },
}

/// Request-level failures, reported before any worker launches.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("At least one persona must be requested")]
    NoPersonas,

    #[error("Unknown personas: {0:?}")]
    UnknownPersonas(Vec<String>),

    #[error("Persona '{0}' requested more than once")]
    DuplicatePersona(String),
}

/// Why a single task produced a failure event.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Contract violation: {0}")]
    Contract(#[from] ContractError),

    #[error("Timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Worker unavailable: {0}")]
    Unavailable(String),
}
