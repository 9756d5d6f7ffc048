use crate::config::RetryConfig;
use crate::error::TaskError;
use crate::feedback::{build_prompt, build_system_prompt, parse_feedback, ReviewFeedback};
use crate::provider::AnalysisCall;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{timeout as tokio_timeout, Instant};
use tracing::{debug, info, warn};

use super::retry::retry_analysis;
use super::task::{CompletionEvent, Task};

/// Run one task to exactly one completion event. Never returns an error.
pub async fn execute_task(
    task: Task,
    retry: RetryConfig,
    semaphore: Arc<Semaphore>,
) -> CompletionEvent {
    let start = std::time::Instant::now();

    // Waiting for a permit does not count against the task's deadline
    let _permit = match semaphore.acquire().await {
        Ok(permit) => permit,
        Err(e) => {
            return failed(&task, TaskError::Unavailable(e.to_string()));
        }
    };

    let budget = task.reviewer.timeout;
    let deadline = Instant::now() + budget;
    let outcome = match tokio_timeout(budget, analyze(&task, &retry, budget, deadline)).await {
        Ok(result) => result,
        Err(_) => Err(TaskError::TimedOut(budget)),
    };

    match outcome {
        Ok(feedback) => {
            info!(
                "Persona {} finished in {:.1}s: score {}, {} issues",
                task.id,
                start.elapsed().as_secs_f64(),
                feedback.score,
                feedback.issues.len()
            );
            CompletionEvent::Success {
                task_id: task.id,
                feedback,
            }
        }
        Err(e) => failed(&task, e),
    }
}

fn failed(task: &Task, error: TaskError) -> CompletionEvent {
    warn!("Persona '{}' failed: {}", task.id, error);
    CompletionEvent::Failure {
        task_id: task.id.clone(),
        error_detail: error.to_string(),
    }
}

async fn analyze(
    task: &Task,
    retry: &RetryConfig,
    timeout: Duration,
    deadline: Instant,
) -> Result<ReviewFeedback, TaskError> {
    let persona = &task.reviewer.persona;
    let input = task.payload.as_ref();
    let system_prompt = build_system_prompt(persona, input.is_flow());
    let prompt = build_prompt(persona, input);

    let call = AnalysisCall {
        persona_id: &task.id,
        system_prompt: &system_prompt,
        prompt: &prompt,
        frames: &input.frames,
    };
    let call = &call;

    retry_analysis(retry, &task.id, deadline, move || async move {
        let output = task.capability.execute(call, timeout).await?;
        debug!(
            "Persona {} got {} bytes from {} in {:?} (exit {})",
            task.id,
            output.stdout.len(),
            task.capability.name(),
            output.duration,
            output.exit_code
        );
        if !output.stderr.trim().is_empty() {
            debug!("Persona {} stderr: {}", task.id, output.stderr.trim());
        }

        let mut feedback = parse_feedback(&output.stdout)?;
        feedback.validate(input.frames.len())?;

        // Attribute the result to the persona that was asked, whatever the
        // model echoed back
        feedback.persona = persona.id.clone();
        feedback.persona_label = persona.label.clone();
        Ok::<_, TaskError>(feedback)
    })
    .await
}
