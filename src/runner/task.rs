use crate::feedback::{AnalysisInput, ReviewFeedback};
use crate::provider::Runner;
use crate::registry::Reviewer;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// One persona's review of the shared input.
#[derive(Clone)]
pub struct Task {
    pub id: String,
    pub reviewer: Reviewer,
    pub payload: Arc<AnalysisInput>,
    pub capability: Arc<dyn Runner>,
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("provider", &self.capability.name())
            .field("frames", &self.payload.frames.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Pending,
    Active,
    Completed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "pending"),
            RunStatus::Active => write!(f, "active"),
            RunStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A validated set of tasks, not yet started.
#[derive(Debug)]
pub struct Run {
    pub id: Uuid,
    pub tasks: Vec<Task>,
    pub started_at: DateTime<Utc>,
    pub status: RunStatus,
}

impl Run {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tasks,
            started_at: Utc::now(),
            status: RunStatus::Pending,
        }
    }

    /// Task ids in submission order
    pub fn task_ids(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.id.clone()).collect()
    }
}

/// Outcome of exactly one task.
#[derive(Debug, Clone)]
pub enum CompletionEvent {
    Success {
        task_id: String,
        feedback: ReviewFeedback,
    },
    Failure {
        task_id: String,
        error_detail: String,
    },
}

impl CompletionEvent {
    pub fn task_id(&self) -> &str {
        match self {
            CompletionEvent::Success { task_id, .. } => task_id,
            CompletionEvent::Failure { task_id, .. } => task_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CompletionEvent::Success { .. })
    }
}

/// What a run stream yields: N completions, then `Done` exactly once.
#[derive(Debug, Clone)]
pub enum RunEvent {
    Completed(CompletionEvent),
    Done,
}

/// A failed task as reported in batch mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskFailure {
    pub persona: String,
    pub detail: String,
}

/// Everything a run produced, in submission order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub feedback: Vec<ReviewFeedback>,
    pub failures: Vec<TaskFailure>,
}
