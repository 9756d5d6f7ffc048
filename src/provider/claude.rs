use super::{command_for, AnalysisCall, ProviderOutput, Runner, StagedFrames};
use crate::error::ProviderError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::timeout as tokio_timeout;
use tracing::debug;

pub struct ClaudeRunner {
    pub binary: PathBuf,
    pub model: String,
    pub tools: Vec<String>,
    pub permission_mode: String,
}

#[async_trait]
impl Runner for ClaudeRunner {
    fn name(&self) -> &'static str {
        "claude_cli"
    }

    async fn execute(
        &self,
        call: &AnalysisCall<'_>,
        timeout: Duration,
    ) -> Result<ProviderOutput, ProviderError> {
        // Screenshots go to disk so the CLI can open them with its Read tool
        let staged = StagedFrames::write(call.frames).await?;

        let file_list = staged
            .paths
            .iter()
            .enumerate()
            .map(|(idx, path)| format!("- frame_index {}: {}", idx, path.display()))
            .collect::<Vec<_>>()
            .join("\n");

        let full_prompt = format!(
            "{}\n\n## Screenshots\nRead each file before answering.\n{}",
            call.prompt, file_list
        );

        let mut cmd = command_for(&self.binary);
        cmd.current_dir(staged.dir());

        // Ensure subscription auth is used (not API key)
        cmd.env_remove("ANTHROPIC_API_KEY");

        cmd.arg("-p")
            .arg(&full_prompt)
            .arg("--append-system-prompt")
            .arg(call.system_prompt)
            .arg("--model")
            .arg(&self.model)
            .arg("--output-format")
            .arg("json")
            .arg("--allowedTools")
            .arg(self.tools.join(","))
            .arg("--permission-mode")
            .arg(&self.permission_mode);

        debug!(
            "claude_cli analyzing {} frames for {}",
            staged.paths.len(),
            call.persona_id
        );

        let start = std::time::Instant::now();

        let output = tokio_timeout(timeout, cmd.output())
            .await
            .map_err(|_| ProviderError::Timeout(timeout))?
            .map_err(ProviderError::Io)?;

        let result = ProviderOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
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

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::feedback::Frame;
    use crate::testing::frame;
    use std::os::unix::fs::PermissionsExt;

    /// Write an executable shell script standing in for the CLI
    fn fake_cli(dir: &std::path::Path, body: &str) -> PathBuf {
        let path = dir.join("fake-claude");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn runner(binary: PathBuf) -> ClaudeRunner {
        ClaudeRunner {
            binary,
            model: "sonnet".to_string(),
            tools: vec!["Read".to_string()],
            permission_mode: "default".to_string(),
        }
    }

    fn call<'a>(frames: &'a [Frame]) -> AnalysisCall<'a> {
        AnalysisCall {
            persona_id: "power_user",
            system_prompt: "system",
            prompt: "review this",
            frames,
        }
    }

    #[tokio::test]
    async fn test_passes_prompt_and_frames() {
        let tmp = tempfile::tempdir().unwrap();
        // Echo back the -p argument so the test can inspect it
        let binary = fake_cli(tmp.path(), r#"printf '%s' "$2""#);
        let frames = vec![frame("Home")];

        let output = runner(binary)
            .execute(&call(&frames), Duration::from_secs(10))
            .await
            .unwrap();

        assert!(output.stdout.starts_with("review this"));
        assert!(output.stdout.contains("frame_index 0: "));
        assert!(output.stdout.contains("frame-0.png"));
        assert_eq!(output.exit_code, 0);
    }

    #[tokio::test]
    async fn test_non_zero_exit() {
        let tmp = tempfile::tempdir().unwrap();
        let binary = fake_cli(tmp.path(), "echo 'rate limited' >&2; exit 3");

        let err = runner(binary)
            .execute(&call(&[]), Duration::from_secs(10))
            .await
            .unwrap_err();

        match err {
            ProviderError::NonZeroExit { code, stderr } => {
                assert_eq!(code, 3);
                assert!(stderr.contains("rate limited"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let tmp = tempfile::tempdir().unwrap();
        let binary = fake_cli(tmp.path(), "sleep 5");

        let err = runner(binary)
            .execute(&call(&[]), Duration::from_millis(100))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Timeout(_)));
    }
}
