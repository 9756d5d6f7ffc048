//! Hand-off from workers to the run stream.
//!
//! Unbounded so a worker never waits on the consumer; events come out in the
//! order workers finished.

use super::task::CompletionEvent;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;

pub fn result_channel() -> (ResultSender, ResultReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ResultSender { tx }, ResultReceiver { rx })
}

#[derive(Debug, Clone)]
pub struct ResultSender {
    tx: mpsc::UnboundedSender<CompletionEvent>,
}

impl ResultSender {
    /// Never blocks. An event put after the receiver is gone is dropped.
    pub fn put(&self, event: CompletionEvent) {
        if let Err(e) = self.tx.send(event) {
            debug!("Run consumer gone, dropping event for {}", e.0.task_id());
        }
    }
}

#[derive(Debug)]
pub struct ResultReceiver {
    rx: mpsc::UnboundedReceiver<CompletionEvent>,
}

impl ResultReceiver {
    /// Wait for the next event. `None` once every sender is gone and the
    /// buffer is drained.
    #[cfg(test)]
    pub async fn get(&mut self) -> Option<CompletionEvent> {
        self.rx.recv().await
    }

    pub fn poll_get(&mut self, cx: &mut Context<'_>) -> Poll<Option<CompletionEvent>> {
        self.rx.poll_recv(cx)
    }
}
