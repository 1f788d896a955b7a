use serde::{Deserialize, Serialize};
use tracing::debug;

/// Coarse lifecycle tag of one sub-task. Unknown strings from the backend
/// parse to `Unknown` instead of failing the whole frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Done,
    Failed,
    Unknown,
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(match tag.as_str() {
            "pending" => TaskStatus::Pending,
            "running" => TaskStatus::Running,
            "done" => TaskStatus::Done,
            "failed" => TaskStatus::Failed,
            _ => TaskStatus::Unknown,
        })
    }
}

/// One item of the backend's decomposed plan. The backend re-sends the whole
/// plan on every progress event; sub-tasks are never patched incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    pub id: u32,
    #[serde(rename = "desc")]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
}

/// One `state_update` frame: a snapshot of the backend's reasoning step.
///
/// Every field is optional on the wire: the backend omits fields it has not
/// populated yet, so all of them default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProgressEvent {
    #[serde(default)]
    pub node: String,
    #[serde(default)]
    pub thought: String,
    #[serde(default)]
    pub node_status: String,
    #[serde(default)]
    pub current_task_index: u32,
    #[serde(default)]
    pub total_tasks: u32,
    #[serde(default)]
    pub sub_tasks: Vec<SubTask>,
}

/// Outbound frames, client to backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Intent { payload: String },
    Cancel,
    Ping,
}

/// Inbound frames, backend to client, discriminated by `type`.
///
/// Anything that is valid JSON but not a known shape lands in `Unrecognized`,
/// which every consumer treats as a no-op. Frames that are not valid JSON at
/// all are dropped by [`ServerMessage::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    StateUpdate(ProgressEvent),
    Result { summary: String },
    Error { payload: String },
    Cancelled,
    Pong,
    #[serde(other)]
    Unrecognized,
}

impl ServerMessage {
    /// Parse one text frame. Returns `None` for frames that are not valid
    /// JSON objects; unknown `type` values still parse, to `Unrecognized`.
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str::<ServerMessage>(raw) {
            Ok(msg) => Some(msg),
            Err(e) => {
                debug!(error = %e, "Dropping malformed frame from backend");
                None
            }
        }
    }
}
