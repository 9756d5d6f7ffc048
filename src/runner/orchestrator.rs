use crate::config::{Config, RetryConfig};
use crate::error::{ConfigError, RunError};
use crate::feedback::AnalysisInput;
use crate::provider::Providers;
use crate::registry::ReviewerRegistry;
use chrono::{DateTime, Utc};
use futures::stream::{Stream, StreamExt};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::channel::{result_channel, ResultReceiver};
use super::executor::execute_task;
use super::task::{BatchReport, CompletionEvent, Run, RunEvent, RunStatus, Task, TaskFailure};

/// Fans one input out to many reviewers and hands back their results as
/// they finish.
pub struct Orchestrator {
    registry: Arc<ReviewerRegistry>,
    providers: Providers,
    retry: RetryConfig,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<ReviewerRegistry>,
        providers: Providers,
        retry: RetryConfig,
        concurrency: usize,
    ) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            registry,
            providers,
            retry,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let registry = ReviewerRegistry::from_config(config)?;
        Ok(Self::new(
            Arc::new(registry),
            Providers::from_config(config),
            config.retry.clone(),
            config.concurrency,
        ))
    }

    pub fn registry(&self) -> &ReviewerRegistry {
        &self.registry
    }

    /// Resolve the requested persona ids into a pending run. Nothing is
    /// launched if any id is rejected.
    pub fn prepare(&self, ids: &[String], input: AnalysisInput) -> Result<Run, RunError> {
        let reviewers = self.registry.resolve(ids)?;
        let payload = Arc::new(input);

        let tasks = reviewers
            .into_iter()
            .map(|reviewer| Task {
                id: reviewer.persona.id.clone(),
                reviewer: reviewer.clone(),
                payload: payload.clone(),
                capability: self.providers.get(reviewer.provider),
            })
            .collect();

        Ok(Run::new(tasks))
    }

    /// Launch every task of the run at once. Events come out of the returned
    /// stream in completion order.
    pub fn start(&self, mut run: Run) -> RunStream {
        let (sender, receiver) = result_channel();
        let mut workers = JoinSet::new();
        let expected = run.tasks.len();

        info!(
            "Starting run {}: {} personas, concurrency {}",
            run.id, expected, self.concurrency
        );

        for task in run.tasks.drain(..) {
            let sender = sender.clone();
            let retry = self.retry.clone();
            let semaphore = self.semaphore.clone();
            let task_id = task.id.clone();

            workers.spawn(async move {
                let event = match AssertUnwindSafe(execute_task(task, retry, semaphore))
                    .catch_unwind()
                    .await
                {
                    Ok(event) => event,
                    Err(_) => {
                        warn!("Worker for {} panicked", task_id);
                        CompletionEvent::Failure {
                            task_id,
                            error_detail: "worker panicked".to_string(),
                        }
                    }
                };
                sender.put(event);
            });
        }
        // Workers hold the only senders now
        drop(sender);

        run.status = RunStatus::Active;

        RunStream {
            run_id: run.id,
            expected,
            received: 0,
            succeeded: 0,
            receiver,
            workers,
            status: run.status,
            started_at: run.started_at,
        }
    }

    /// Run to completion and report results in submission order.
    pub async fn collect(&self, run: Run) -> BatchReport {
        let order = run.task_ids();
        let mut stream = self.start(run);

        let mut events = Vec::with_capacity(order.len());
        while let Some(event) = stream.next().await {
            if let RunEvent::Completed(event) = event {
                events.push(event);
            }
        }

        assemble_report(&order, events)
    }
}

fn assemble_report(order: &[String], mut events: Vec<CompletionEvent>) -> BatchReport {
    events.sort_by_key(|event| {
        order
            .iter()
            .position(|id| id == event.task_id())
            .unwrap_or(usize::MAX)
    });

    let mut report = BatchReport {
        feedback: Vec::new(),
        failures: Vec::new(),
    };
    for event in events {
        match event {
            CompletionEvent::Success { feedback, .. } => report.feedback.push(feedback),
            CompletionEvent::Failure {
                task_id,
                error_detail,
            } => report.failures.push(TaskFailure {
                persona: task_id,
                detail: error_detail,
            }),
        }
    }
    report
}

/// Completion events of one run, then a single `Done`.
///
/// Dropping the stream before `Done` cancels every worker still running.
pub struct RunStream {
    run_id: Uuid,
    expected: usize,
    received: usize,
    succeeded: usize,
    receiver: ResultReceiver,
    workers: JoinSet<()>,
    status: RunStatus,
    started_at: DateTime<Utc>,
}

impl RunStream {
    #[cfg(test)]
    pub fn status(&self) -> RunStatus {
        self.status
    }

    fn finish(&mut self) -> RunEvent {
        self.status = RunStatus::Completed;
        info!(
            "Run {} finished: {} succeeded, {} failed in {}ms",
            self.run_id,
            self.succeeded,
            self.received - self.succeeded,
            (Utc::now() - self.started_at).num_milliseconds()
        );
        RunEvent::Done
    }
}

impl Stream for RunStream {
    type Item = RunEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<RunEvent>> {
        let this = self.get_mut();

        if this.status == RunStatus::Completed {
            return Poll::Ready(None);
        }

        if this.received < this.expected {
            match this.receiver.poll_get(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(event)) => {
                    this.received += 1;
                    if event.is_success() {
                        this.succeeded += 1;
                    }
                    debug!(
                        "Run {}: {} of {} done ({})",
                        this.run_id,
                        this.received,
                        this.expected,
                        event.task_id()
                    );
                    return Poll::Ready(Some(RunEvent::Completed(event)));
                }
                Poll::Ready(None) => {
                    warn!(
                        "Run {}: workers exited with {} of {} results",
                        this.run_id, this.received, this.expected
                    );
                }
            }
        }

        Poll::Ready(Some(this.finish()))
    }
}

impl Drop for RunStream {
    fn drop(&mut self) {
        if self.status != RunStatus::Completed && self.received < self.expected {
            info!(
                "Run {} abandoned with {} personas in flight, cancelling",
                self.run_id,
                self.expected - self.received
            );
        }
        self.workers.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        feedback_json, orchestrator, orchestrator_with_limit, sample_input, ScriptedRunner, Step,
    };
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    /// a finishes second, b fails last, c finishes first
    fn staggered() -> ScriptedRunner {
        ScriptedRunner::new()
            .script("a", vec![Step::ok(200, &feedback_json("a", 7))])
            .script("b", vec![Step::fail(300, "provider exploded")])
            .script("c", vec![Step::ok(100, &feedback_json("c", 4))])
    }

    async fn drain(mut stream: RunStream) -> Vec<RunEvent> {
        let mut events = Vec::new();
        while let Some(event) = stream.next().await {
            events.push(event);
        }
        events
    }

    fn describe(event: &RunEvent) -> String {
        match event {
            RunEvent::Completed(CompletionEvent::Success { task_id, .. }) => {
                format!("ok:{}", task_id)
            }
            RunEvent::Completed(CompletionEvent::Failure { task_id, .. }) => {
                format!("err:{}", task_id)
            }
            RunEvent::Done => "done".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_arrive_in_completion_order() {
        let orch = orchestrator(&["a", "b", "c"], staggered());
        let run = orch.prepare(&ids(&["a", "b", "c"]), sample_input()).unwrap();

        let events = drain(orch.start(run)).await;
        let order: Vec<_> = events.iter().map(describe).collect();
        assert_eq!(order, vec!["ok:c", "ok:a", "err:b", "done"]);

        match &events[2] {
            RunEvent::Completed(CompletionEvent::Failure { error_detail, .. }) => {
                assert!(error_detail.contains("provider exploded"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_ends_after_done() {
        let orch = orchestrator(&["a", "b", "c"], staggered());
        let run = orch.prepare(&ids(&["a", "c"]), sample_input()).unwrap();
        let mut stream = orch.start(run);

        let mut count = 0;
        while let Some(event) = stream.next().await {
            count += 1;
            if matches!(event, RunEvent::Done) {
                break;
            }
        }
        assert_eq!(count, 3);
        assert_eq!(stream.status(), RunStatus::Completed);
        assert!(stream.next().await.is_none());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_run_yields_done_immediately() {
        let orch = orchestrator(&["a"], ScriptedRunner::new());
        let events = drain(orch.start(Run::new(Vec::new()))).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RunEvent::Done));
    }

    #[tokio::test]
    async fn test_prepare_rejects_bad_requests() {
        let runner = ScriptedRunner::new();
        let calls = runner.calls();
        let orch = orchestrator(&["a", "b"], runner);

        assert!(matches!(
            orch.prepare(&[], sample_input()),
            Err(RunError::NoPersonas)
        ));
        assert!(matches!(
            orch.prepare(&ids(&["a", "zzz"]), sample_input()),
            Err(RunError::UnknownPersonas(ref unknown)) if unknown == &vec!["zzz".to_string()]
        ));
        assert!(matches!(
            orch.prepare(&ids(&["a", "a"]), sample_input()),
            Err(RunError::DuplicatePersona(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_prepare_keeps_submission_order() {
        let orch = orchestrator(&["a", "b", "c"], ScriptedRunner::new());
        let run = orch.prepare(&ids(&["c", "a"]), sample_input()).unwrap();

        assert_eq!(run.task_ids(), vec!["c", "a"]);
        assert_eq!(run.status, RunStatus::Pending);
        assert!(Arc::ptr_eq(&run.tasks[0].payload, &run.tasks[1].payload));
    }

    #[tokio::test(start_paused = true)]
    async fn test_collect_reports_in_submission_order() {
        let orch = orchestrator(&["a", "b", "c"], staggered());
        let run = orch.prepare(&ids(&["a", "b", "c"]), sample_input()).unwrap();

        let report = orch.collect(run).await;
        let personas: Vec<_> = report.feedback.iter().map(|f| f.persona.as_str()).collect();
        assert_eq!(personas, vec!["a", "c"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].persona, "b");
        assert!(report.failures[0].detail.contains("provider exploded"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_stream_cancels_workers() {
        let runner = ScriptedRunner::new()
            .script("a", vec![Step::ok(10, &feedback_json("a", 7))])
            .script("b", vec![Step::ok(10_000, &feedback_json("b", 7))]);
        let finished = runner.finished();
        let cancelled = runner.cancelled();
        let orch = orchestrator(&["a", "b"], runner);
        let run = orch.prepare(&ids(&["a", "b"]), sample_input()).unwrap();

        let mut stream = orch.start(run);
        let first = stream.next().await.unwrap();
        assert_eq!(describe(&first), "ok:a");
        drop(stream);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_worker_becomes_failure() {
        let runner = ScriptedRunner::new()
            .script("a", vec![Step::panic(10)])
            .script("b", vec![Step::ok(20, &feedback_json("b", 6))]);
        let orch = orchestrator(&["a", "b"], runner);
        let run = orch.prepare(&ids(&["a", "b"]), sample_input()).unwrap();

        let events = drain(orch.start(run)).await;
        let order: Vec<_> = events.iter().map(describe).collect();
        assert_eq!(order, vec!["err:a", "ok:b", "done"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_wait_does_not_count_against_timeout() {
        // Fixture timeout is 30s; two 20s reviews behind one permit take 40s
        let runner = ScriptedRunner::new()
            .script("a", vec![Step::ok(20_000, &feedback_json("a", 7))])
            .script("b", vec![Step::ok(20_000, &feedback_json("b", 7))]);
        let orch = orchestrator_with_limit(&["a", "b"], runner, 1);
        let run = orch.prepare(&ids(&["a", "b"]), sample_input()).unwrap();

        let start = tokio::time::Instant::now();
        let report = orch.collect(run).await;
        assert_eq!(report.feedback.len(), 2);
        assert!(report.failures.is_empty());
        assert!(start.elapsed() >= Duration::from_secs(40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_moves_to_completed() {
        let orch = orchestrator(&["a"], staggered());
        let run = orch.prepare(&ids(&["a"]), sample_input()).unwrap();

        let mut stream = orch.start(run);
        assert_eq!(stream.status(), RunStatus::Active);
        while stream.next().await.is_some() {}
        assert_eq!(stream.status(), RunStatus::Completed);
    }
}
