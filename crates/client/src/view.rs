use zenith_core::TaskStatus;

use crate::session::Session;
use crate::transport::ConnectionState;

/// How a sub-task should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubTaskVisual {
    /// Not started yet (also the fallback for unknown statuses).
    Dim,
    /// Currently executing.
    Pulsing,
    /// Completed; rendered struck through.
    Struck,
    /// Failed.
    Alert,
}

impl SubTaskVisual {
    fn for_status(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Pending | TaskStatus::Unknown => SubTaskVisual::Dim,
            TaskStatus::Running => SubTaskVisual::Pulsing,
            TaskStatus::Done => SubTaskVisual::Struck,
            TaskStatus::Failed => SubTaskVisual::Alert,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubTaskView {
    pub id: u32,
    pub description: String,
    pub visual: SubTaskVisual,
}

/// One line of the thought log: the full replay of every progress event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThoughtLine {
    pub label: String,
    pub thought: String,
    pub received_at_ms: i64,
}

/// Derived display state. Pure projection of `(Session, ConnectionState)`;
/// recomputed on every change, never mutates the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub connection: ConnectionState,
    /// Latest node label; present only while no result has arrived.
    pub status_line: Option<String>,
    /// The last progress event's sub-task plan, wholesale.
    pub subtasks: Vec<SubTaskView>,
    pub thoughts: Vec<ThoughtLine>,
    pub result: Option<String>,
    pub error: Option<String>,
}

/// Fixed label table for the backend's node status tags. Values outside the
/// table display verbatim.
pub fn status_label(node_status: &str) -> &str {
    match node_status {
        "parse_intent" => "Parsing intent",
        "browser_action" => "Browsing",
        "self_correct" => "Self-correcting",
        "advance" => "Next sub-task",
        "summarize" => "Summarizing",
        "done" => "Done",
        other => other,
    }
}

impl ViewModel {
    pub fn project(session: &Session, connection: ConnectionState) -> Self {
        let last = session.history().last();

        let status_line = match session.result() {
            Some(_) => None,
            None => last.map(|entry| status_label(&entry.event.node_status).to_string()),
        };

        let subtasks = last
            .map(|entry| {
                entry
                    .event
                    .sub_tasks
                    .iter()
                    .map(|task| SubTaskView {
                        id: task.id,
                        description: task.description.clone(),
                        visual: SubTaskVisual::for_status(task.status),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let thoughts = session
            .history()
            .iter()
            .map(|entry| ThoughtLine {
                label: status_label(&entry.event.node_status).to_string(),
                thought: entry.event.thought.clone(),
                received_at_ms: entry.received_at_ms,
            })
            .collect();

        Self {
            connection,
            status_line,
            subtasks,
            thoughts,
            result: session.result().map(str::to_string),
            error: session.error().map(str::to_string),
        }
    }
}
