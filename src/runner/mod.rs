mod channel;
mod executor;
mod orchestrator;
mod retry;
mod task;

pub use orchestrator::Orchestrator;
pub use task::{BatchReport, CompletionEvent, Run, RunEvent};

#[cfg(test)]
pub use task::Task;
