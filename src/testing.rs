//! Test doubles shared by unit tests across modules.

use crate::config::{Config, Persona, Provider, RetryConfig};
use crate::error::ProviderError;
use crate::feedback::{AnalysisInput, DecodedImage, DesignMetadata, Dimensions, Frame};
use crate::provider::{AnalysisCall, ProviderOutput, Providers, Runner};
use crate::registry::{Reviewer, ReviewerRegistry};
use crate::runner::{Orchestrator, Task};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

pub const TINY_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

pub fn frame(name: &str) -> Frame {
    Frame {
        image: DecodedImage {
            bytes: TINY_PNG.to_vec(),
            media_type: "image/png",
        },
        metadata: DesignMetadata {
            frame_name: name.to_string(),
            dimensions: Dimensions {
                width: 1440,
                height: 900,
            },
            text_content: vec![],
            colors: vec![],
            component_names: vec![],
        },
    }
}

pub fn sample_input() -> AnalysisInput {
    AnalysisInput {
        frames: vec![frame("Home")],
        context: None,
    }
}

/// A well-formed provider answer
pub fn feedback_json(persona: &str, score: u8) -> String {
    serde_json::json!({
        "persona": persona,
        "persona_label": persona,
        "overall_impression": format!("Review by {}", persona),
        "issues": [{
            "severity": "medium",
            "area": "Header",
            "description": "Low contrast",
            "suggestion": "Darken the text"
        }],
        "positives": ["Clear layout"],
        "score": score,
        "annotations": [{
            "x_pct": 0, "y_pct": 0, "width_pct": 100, "height_pct": 10,
            "issue_index": 0, "label": "Header"
        }]
    })
    .to_string()
}

/// Built-in persona when the id matches one, otherwise a generic fixture
pub fn persona(id: &str) -> Persona {
    Config::default()
        .personas
        .into_iter()
        .find(|p| p.id == id)
        .unwrap_or_else(|| Persona {
            id: id.to_string(),
            label: id.to_uppercase(),
            system_prompt: format!("You are reviewer {}.", id),
            enabled: true,
            provider: None,
            timeout_sec: None,
        })
}

pub fn reviewer(id: &str, timeout: Duration) -> Reviewer {
    Reviewer {
        persona: persona(id),
        provider: Provider::ClaudeCli,
        timeout,
    }
}

pub fn registry(ids: &[&str]) -> ReviewerRegistry {
    ReviewerRegistry::new(
        ids.iter()
            .map(|id| reviewer(id, Duration::from_secs(30)))
            .collect(),
    )
    .unwrap()
}

pub fn make_task(id: &str, runner: ScriptedRunner, timeout: Duration) -> Task {
    Task {
        id: id.to_string(),
        reviewer: reviewer(id, timeout),
        payload: Arc::new(sample_input()),
        capability: Arc::new(runner),
    }
}

/// Orchestrator over a fixture registry, one attempt per task
pub fn orchestrator(ids: &[&str], runner: ScriptedRunner) -> Orchestrator {
    orchestrator_with_limit(ids, runner, 8)
}

pub fn orchestrator_with_limit(
    ids: &[&str],
    runner: ScriptedRunner,
    concurrency: usize,
) -> Orchestrator {
    Orchestrator::new(
        Arc::new(registry(ids)),
        Providers::uniform(Arc::new(runner)),
        RetryConfig {
            max_attempts: 1,
            backoff_base_ms: 10,
        },
        concurrency,
    )
}

#[derive(Debug, Clone)]
enum Outcome {
    Stdout(String),
    Fail(String),
    MissingBinary,
    Panic,
}

#[derive(Debug, Clone)]
pub struct Step {
    delay: Duration,
    outcome: Outcome,
}

impl Step {
    pub fn ok(delay_ms: u64, stdout: &str) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            outcome: Outcome::Stdout(stdout.to_string()),
        }
    }

    pub fn fail(delay_ms: u64, message: &str) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            outcome: Outcome::Fail(message.to_string()),
        }
    }

    /// The provider CLI could not be spawned
    pub fn missing_binary() -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Outcome::MissingBinary,
        }
    }

    pub fn panic(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            outcome: Outcome::Panic,
        }
    }
}

/// Marks a call as cancelled if its future is dropped before finishing
struct CallGuard {
    finished: bool,
    cancelled: Arc<AtomicUsize>,
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Runner whose per-persona delay and outcome are scripted. The last step of
/// a script repeats.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    scripts: Arc<Mutex<HashMap<String, VecDeque<Step>>>>,
    calls: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
    cancelled: Arc<AtomicUsize>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, persona_id: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(persona_id.to_string(), steps.into());
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    pub fn finished(&self) -> Arc<AtomicUsize> {
        self.finished.clone()
    }

    pub fn cancelled(&self) -> Arc<AtomicUsize> {
        self.cancelled.clone()
    }

    fn next_step(&self, persona_id: &str) -> Option<Step> {
        let mut scripts = self.scripts.lock().unwrap();
        let steps = scripts.get_mut(persona_id)?;
        if steps.len() > 1 {
            steps.pop_front()
        } else {
            steps.front().cloned()
        }
    }
}

#[async_trait]
impl Runner for ScriptedRunner {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn execute(
        &self,
        call: &AnalysisCall<'_>,
        _timeout: Duration,
    ) -> Result<ProviderOutput, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.next_step(call.persona_id).unwrap_or_else(|| {
            Step::fail(0, &format!("no script for {}", call.persona_id))
        });

        let mut guard = CallGuard {
            finished: false,
            cancelled: self.cancelled.clone(),
        };
        sleep(step.delay).await;
        guard.finished = true;
        self.finished.fetch_add(1, Ordering::SeqCst);

        match step.outcome {
            Outcome::Stdout(stdout) => Ok(ProviderOutput {
                stdout,
                stderr: String::new(),
                duration: step.delay,
                exit_code: 0,
            }),
            Outcome::Fail(stderr) => Err(ProviderError::NonZeroExit { code: 1, stderr }),
            Outcome::MissingBinary => Err(ProviderError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No such file or directory",
            ))),
            Outcome::Panic => panic!("scripted panic for {}", call.persona_id),
        }
    }
}
