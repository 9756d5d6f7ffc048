mod claude;
mod codex;

pub use claude::ClaudeRunner;
pub use codex::CodexRunner;

use crate::config::{Config, Provider};
use crate::error::ProviderError;
use crate::feedback::{DecodedImage, Frame};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Debug)]
pub struct ProviderOutput {
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    pub exit_code: i32,
}

/// Everything a provider needs for one analysis.
#[derive(Debug)]
pub struct AnalysisCall<'a> {
    pub persona_id: &'a str,
    pub system_prompt: &'a str,
    pub prompt: &'a str,
    pub frames: &'a [Frame],
}

/// An analysis capability: takes prompts and frames, returns raw model output.
#[async_trait]
pub trait Runner: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(
        &self,
        call: &AnalysisCall<'_>,
        timeout: Duration,
    ) -> Result<ProviderOutput, ProviderError>;
}

/// One runner per provider kind, shared across runs.
#[derive(Clone)]
pub struct Providers {
    claude_cli: Arc<dyn Runner>,
    codex_cli: Arc<dyn Runner>,
}

impl Providers {
    pub fn from_config(config: &Config) -> Self {
        Self {
            claude_cli: Arc::new(ClaudeRunner {
                binary: config.providers.claude_cli.binary.clone(),
                model: config.providers.claude_cli.model.clone(),
                tools: config.providers.claude_cli.tools.clone(),
                permission_mode: config.providers.claude_cli.permission_mode.clone(),
            }),
            codex_cli: Arc::new(CodexRunner {
                binary: config.providers.codex_cli.binary.clone(),
                model: config.providers.codex_cli.model.clone(),
            }),
        }
    }

    /// Route every provider kind to the same runner
    #[cfg(test)]
    pub fn uniform(runner: Arc<dyn Runner>) -> Self {
        Self {
            claude_cli: runner.clone(),
            codex_cli: runner,
        }
    }

    pub fn get(&self, provider: Provider) -> Arc<dyn Runner> {
        match provider {
            Provider::ClaudeCli => self.claude_cli.clone(),
            Provider::CodexCli => self.codex_cli.clone(),
        }
    }
}

fn frame_file_name(idx: usize, image: &DecodedImage) -> String {
    format!("frame-{}.{}", idx, image.extension())
}

/// Frames written to a private temp dir. Dropping it removes the files, which
/// also happens when a worker is aborted mid-call.
pub(crate) struct StagedFrames {
    dir: TempDir,
    pub paths: Vec<PathBuf>,
}

impl StagedFrames {
    pub async fn write(frames: &[Frame]) -> Result<Self, ProviderError> {
        let dir = tempfile::Builder::new()
            .prefix("panelrev-")
            .tempdir()
            .map_err(ProviderError::Io)?;

        let mut paths = Vec::with_capacity(frames.len());
        for (idx, frame) in frames.iter().enumerate() {
            let path = dir.path().join(frame_file_name(idx, &frame.image));
            tokio::fs::write(&path, &frame.image.bytes)
                .await
                .map_err(ProviderError::Io)?;
            paths.push(path);
        }

        Ok(Self { dir, paths })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Command for a provider CLI. Bare names are looked up on PATH.
pub(crate) fn command_for(binary: &Path) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(binary);
    // An aborted worker must not leave the CLI running
    cmd.kill_on_drop(true);
    cmd
}
