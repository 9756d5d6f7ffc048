use crate::config::RetryConfig;
use crate::error::{ProviderError, TaskError};
use rand::Rng;
use std::future::Future;
use std::io::ErrorKind;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Whether another attempt could plausibly succeed. A missing or
/// non-executable provider binary stays missing.
fn is_retryable(error: &TaskError) -> bool {
    match error {
        TaskError::Provider(ProviderError::Io(e)) => {
            !matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied)
        }
        TaskError::Provider(_) | TaskError::Contract(_) => true,
        TaskError::TimedOut(_) | TaskError::Unavailable(_) => false,
    }
}

/// Delay after the `attempt`th failure: base * 2^(attempt - 1) plus up to
/// `base` of jitter.
fn backoff(config: &RetryConfig, attempt: u32) -> Duration {
    let base = config.backoff_base_ms;
    let exponential = base.saturating_mul(1u64 << attempt.saturating_sub(1).min(16));
    let jitter = if base == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..base)
    };
    Duration::from_millis(exponential.saturating_add(jitter))
}

/// Run one persona's analysis attempt until it succeeds, the attempts run
/// out, the error is one retrying cannot fix, or the backoff would overrun
/// `deadline`.
pub async fn retry_analysis<F, Fut, T>(
    config: &RetryConfig,
    persona: &str,
    deadline: Instant,
    mut attempt: F,
) -> Result<T, TaskError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TaskError>>,
{
    let mut attempts = 0;

    loop {
        attempts += 1;

        let error = match attempt().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if attempts >= config.max_attempts {
            if attempts > 1 {
                warn!("Persona {}: all {} attempts failed: {}", persona, attempts, error);
            }
            return Err(error);
        }
        if !is_retryable(&error) {
            debug!("Persona {}: not retrying: {}", persona, error);
            return Err(error);
        }

        let delay = backoff(config, attempts);
        if Instant::now() + delay >= deadline {
            warn!(
                "Persona {}: attempt {} failed with no time left to retry: {}",
                persona, attempts, error
            );
            return Err(error);
        }

        warn!(
            "Persona {}: attempt {} failed: {}. Retrying in {:?}",
            persona, attempts, error, delay
        );
        sleep(delay).await;
    }
}
