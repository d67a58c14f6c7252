//! # Background Tasks
//!
//! Long-running transfers (file uplink, simulated pressure stream) run as
//! tasks next to the station loop. They never touch the serial port: every
//! frame they produce is handed to the station as a [`TaskEvent`] and written
//! there, whole, in the order it was produced. Cancelling a task therefore
//! never leaves a partial frame on the wire.

use std::future::Future;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{GroundStationError, Result};

/// Message from a background task to the station loop
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// Encoded frame to write, with a line for the session log
    Frame { bytes: Vec<u8>, note: String },

    /// Line for the session log only
    Note(String),

    /// Task ran to completion, was cancelled, or had nothing to do
    Finished { task: &'static str, outcome: TransferOutcome },

    /// Task stopped on an error
    Failed { task: &'static str, error: String },
}

/// How a transfer ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Nothing to send; zero frames emitted
    Empty,
    /// Every frame was emitted
    Completed { sent: usize },
    /// Stopped early; `sent` frames made it out
    Cancelled { sent: usize, total: usize },
}

impl std::fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferOutcome::Empty => write!(f, "nothing to send"),
            TransferOutcome::Completed { sent } => write!(f, "completed, {} packets sent", sent),
            TransferOutcome::Cancelled { sent, total } => {
                write!(f, "cancelled after {}/{} packets", sent, total)
            }
        }
    }
}

/// Queued events per task before the task waits on the station
pub const TASK_EVENT_CAPACITY: usize = 16;

/// Handle to the running background task
///
/// The handle owns the receiving end of the task's event channel. Dropping
/// the handle cancels the task and discards anything it had queued, so a
/// preempted transfer can never get another frame onto the wire.
#[derive(Debug)]
pub struct BackgroundTask {
    name: &'static str,
    cancel: CancellationToken,
    events: mpsc::Receiver<TaskEvent>,
}

impl BackgroundTask {
    /// Spawn a transfer and report its result as a [`TaskEvent`]
    ///
    /// `make` receives the event sender and a cancellation token; the
    /// resulting future's outcome (or error) is delivered as the task's last
    /// event.
    pub fn spawn<F, Fut>(name: &'static str, make: F) -> Self
    where
        F: FnOnce(mpsc::Sender<TaskEvent>, CancellationToken) -> Fut,
        Fut: Future<Output = Result<TransferOutcome>> + Send + 'static,
    {
        let (tx, events) = mpsc::channel(TASK_EVENT_CAPACITY);
        let cancel = CancellationToken::new();
        let transfer = make(tx.clone(), cancel.clone());

        tokio::spawn(async move {
            let event = match transfer.await {
                Ok(outcome) => TaskEvent::Finished { task: name, outcome },
                Err(e) => TaskEvent::Failed { task: name, error: e.to_string() },
            };
            // Receiver is gone if the task was preempted
            let _ = tx.send(event).await;
        });

        debug!("Spawned background task: {}", name);
        Self { name, cancel, events }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Next event from the task; `None` once it has exited
    pub async fn next_event(&mut self) -> Option<TaskEvent> {
        self.events.recv().await
    }

    /// Request cancellation; the task stops before its next frame
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Hand one encoded frame to the station
pub(crate) async fn emit_frame(
    events: &mpsc::Sender<TaskEvent>,
    bytes: Vec<u8>,
    note: String,
) -> Result<()> {
    events
        .send(TaskEvent::Frame { bytes, note })
        .await
        .map_err(|_| GroundStationError::LinkClosed)
}

/// Send a log line to the station
pub(crate) async fn emit_note(events: &mpsc::Sender<TaskEvent>, note: String) -> Result<()> {
    events
        .send(TaskEvent::Note(note))
        .await
        .map_err(|_| GroundStationError::LinkClosed)
}

/// Wait out a pacing delay; false if cancelled first
pub(crate) async fn pace(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_reports_outcome() {
        let mut task = BackgroundTask::spawn("noop", |_events, _cancel| async {
            Ok(TransferOutcome::Empty)
        });
        assert_eq!(task.name(), "noop");

        let event = task.next_event().await.unwrap();
        assert_eq!(event, TaskEvent::Finished { task: "noop", outcome: TransferOutcome::Empty });
        assert!(task.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_spawn_reports_error() {
        let mut task = BackgroundTask::spawn("broken", |_events, _cancel| async {
            Err(GroundStationError::LinkClosed)
        });

        match task.next_event().await.unwrap() {
            TaskEvent::Failed { task, error } => {
                assert_eq!(task, "broken");
                assert!(error.contains("Link closed"));
            }
            other => panic!("Expected Failed, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let mut task = BackgroundTask::spawn("counter", |events, _cancel| async move {
            for i in 0..3u8 {
                emit_frame(&events, vec![i], format!("frame {}", i)).await?;
            }
            Ok(TransferOutcome::Completed { sent: 3 })
        });

        for i in 0..3u8 {
            assert_eq!(
                task.next_event().await.unwrap(),
                TaskEvent::Frame { bytes: vec![i], note: format!("frame {}", i) }
            );
        }
        assert!(matches!(task.next_event().await, Some(TaskEvent::Finished { .. })));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pacing() {
        let mut task = BackgroundTask::spawn("sleeper", |_events, cancel| async move {
            if pace(Duration::from_secs(60), &cancel).await {
                Ok(TransferOutcome::Completed { sent: 1 })
            } else {
                Ok(TransferOutcome::Cancelled { sent: 0, total: 1 })
            }
        });

        task.cancel();
        let event = task.next_event().await.unwrap();
        assert_eq!(
            event,
            TaskEvent::Finished {
                task: "sleeper",
                outcome: TransferOutcome::Cancelled { sent: 0, total: 1 }
            }
        );
    }

    #[tokio::test]
    async fn test_drop_stops_task() {
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        let task = BackgroundTask::spawn("dropped", |events, cancel| async move {
            let mut sent = 0;
            loop {
                if emit_frame(&events, vec![0], String::new()).await.is_err() || cancel.is_cancelled() {
                    break;
                }
                sent += 1;
            }
            let _ = done_tx.send(sent);
            Ok(TransferOutcome::Cancelled { sent, total: usize::MAX })
        });

        drop(task);
        let sent = done_rx.await.unwrap();
        assert!(sent <= TASK_EVENT_CAPACITY);
    }

    #[tokio::test]
    async fn test_emit_frame_after_station_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let result = emit_frame(&tx, vec![0xFF, 0x01, 0x00], "note".into()).await;
        assert!(matches!(result, Err(GroundStationError::LinkClosed)));
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(TransferOutcome::Completed { sent: 5 }.to_string(), "completed, 5 packets sent");
        assert_eq!(
            TransferOutcome::Cancelled { sent: 2, total: 5 }.to_string(),
            "cancelled after 2/5 packets"
        );
    }
}
