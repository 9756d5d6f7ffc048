use super::{command_for, AnalysisCall, ProviderOutput, Runner, StagedFrames};
use crate::error::ProviderError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout as tokio_timeout;
use tracing::debug;

pub struct CodexRunner {
    pub binary: PathBuf,
    pub model: String,
}

#[async_trait]
impl Runner for CodexRunner {
    fn name(&self) -> &'static str {
        "codex_cli"
    }

    async fn execute(
        &self,
        call: &AnalysisCall<'_>,
        timeout: Duration,
    ) -> Result<ProviderOutput, ProviderError> {
        let staged = StagedFrames::write(call.frames).await?;

        // Codex has no system prompt flag; the persona leads the prompt instead
        let full_prompt = format!("{}\n\n---\n\n{}", call.system_prompt, call.prompt);

        // Final assistant message is captured here, free of JSONL event noise
        let last_message = staged.dir().join("last-message.txt");

        let mut cmd = command_for(&self.binary);
        cmd.arg("exec")
            .arg("--model")
            .arg(&self.model)
            .arg("--json")
            .arg("--output-last-message")
            .arg(&last_message);
        for path in &staged.paths {
            cmd.arg("--image").arg(path);
        }

        // Read prompt from stdin
        cmd.arg("-");

        cmd.current_dir(staged.dir());
        cmd.stdin(std::process::Stdio::piped());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());

        debug!(
            "codex_cli analyzing {} frames for {}",
            staged.paths.len(),
            call.persona_id
        );

        let start = std::time::Instant::now();

        let mut child = cmd.spawn().map_err(ProviderError::Io)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(full_prompt.as_bytes())
                .await
                .map_err(ProviderError::Io)?;
            stdin.shutdown().await.map_err(ProviderError::Io)?;
        }

        let output = tokio_timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| ProviderError::Timeout(timeout))?
            .map_err(ProviderError::Io)?;

        let stdout = match tokio::fs::read_to_string(&last_message).await {
            Ok(message) if !message.trim().is_empty() => message,
            _ => String::from_utf8_lossy(&output.stdout).to_string(),
        };

        let result = ProviderOutput {
            stdout,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: start.elapsed(),
            exit_code: output.status.code().unwrap_or(-1),
        };

        if !output.status.success() {
            return Err(ProviderError::NonZeroExit {
                code: result.exit_code,
                stderr: result.stderr,
            });
        }

        Ok(result)
    }
}
