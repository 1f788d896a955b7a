use tracing::{debug, info, warn};
use zenith_core::{ProgressEvent, ServerMessage};

/// One received progress event, stamped with the client-side receive time.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub event: ProgressEvent,
    pub received_at_ms: i64,
}

/// Client-side record of one task: the ordered progress history and the
/// terminal result. Reset atomically on every new submission; owned by one
/// UI-surface lifetime.
///
/// The reducer is a display log, not an authority on task completion: it
/// appends every well-formed progress event unconditionally and never
/// validates `node_status` sequencing.
#[derive(Debug, Default)]
pub struct Session {
    history: Vec<HistoryEntry>,
    result: Option<String>,
    error: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Clear history, result, and error together. Called exactly once per
    /// submission, before the outbound intent frame is sent.
    pub fn reset(&mut self) {
        self.history.clear();
        self.result = None;
        self.error = None;
    }

    /// Fold one parsed inbound frame into the session.
    pub fn apply(&mut self, frame: ServerMessage) {
        match frame {
            ServerMessage::StateUpdate(event) => {
                debug!(
                    node = %event.node,
                    node_status = %event.node_status,
                    sub_tasks = event.sub_tasks.len(),
                    "Progress event"
                );
                self.history.push(HistoryEntry {
                    event,
                    received_at_ms: chrono::Utc::now().timestamp_millis(),
                });
            }
            ServerMessage::Result { summary } => {
                info!("Task finished");
                self.result = Some(summary);
            }
            ServerMessage::Error { payload } => {
                warn!(error = %payload, "Agent reported a failure");
                self.error = Some(payload);
            }
            ServerMessage::Cancelled => {
                debug!("Cancel acknowledged by backend");
            }
            ServerMessage::Pong => {}
            ServerMessage::Unrecognized => {
                debug!("Ignoring unrecognized frame");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zenith_core::{SubTask, TaskStatus};

    fn progress(node_status: &str, sub_tasks: Vec<SubTask>) -> ServerMessage {
        ServerMessage::StateUpdate(ProgressEvent {
            node_status: node_status.to_string(),
            sub_tasks,
            ..Default::default()
        })
    }

    fn task(id: u32, status: TaskStatus) -> SubTask {
        SubTask {
            id,
            description: format!("task {}", id),
            status,
        }
    }

    #[test]
    fn test_progress_events_append_in_order() {
        let mut session = Session::new();
        session.apply(progress("parse_intent", vec![]));
        session.apply(progress("browser_action", vec![]));
        session.apply(progress("browser_action", vec![]));

        let statuses: Vec<_> = session
            .history()
            .iter()
            .map(|entry| entry.event.node_status.as_str())
            .collect();
        assert_eq!(statuses, ["parse_intent", "browser_action", "browser_action"]);
    }

    #[test]
    fn test_out_of_order_statuses_are_not_rejected() {
        let mut session = Session::new();
        session.apply(progress("done", vec![]));
        session.apply(progress("parse_intent", vec![]));
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_result_does_not_clear_history() {
        let mut session = Session::new();
        session.apply(progress("summarize", vec![]));
        session.apply(ServerMessage::Result {
            summary: "all done".to_string(),
        });
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.result(), Some("all done"));
    }

    #[test]
    fn test_immediate_result_without_progress_is_valid() {
        let mut session = Session::new();
        session.apply(ServerMessage::Result {
            summary: "instant".to_string(),
        });
        assert!(session.history().is_empty());
        assert_eq!(session.result(), Some("instant"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = Session::new();
        session.apply(progress("browser_action", vec![task(1, TaskStatus::Running)]));
        session.apply(ServerMessage::Result {
            summary: "done".to_string(),
        });
        session.apply(ServerMessage::Error {
            payload: "partial failure".to_string(),
        });

        session.reset();
        assert!(session.history().is_empty());
        assert!(session.result().is_none());
        assert!(session.error().is_none());
    }

    #[test]
    fn test_noop_frames_change_nothing() {
        let mut session = Session::new();
        session.apply(progress("browser_action", vec![]));
        session.apply(ServerMessage::Pong);
        session.apply(ServerMessage::Cancelled);
        session.apply(ServerMessage::Unrecognized);
        assert_eq!(session.history().len(), 1);
        assert!(session.result().is_none());
        assert!(session.error().is_none());
    }

    #[test]
    fn test_error_frame_is_stored() {
        let mut session = Session::new();
        session.apply(ServerMessage::Error {
            payload: "graph execution failed".to_string(),
        });
        assert_eq!(session.error(), Some("graph execution failed"));
    }
}
