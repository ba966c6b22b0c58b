//! Wire payloads shared by the submission path, the queue, the worker and
//! the notification channel.

use serde::{Deserialize, Serialize};

use crate::error_code::ErrorCode;
use crate::task_status::TaskStatus;
use crate::types::TaskId;

/// Inbound text command that asks the server to cancel the task bound to
/// the notification connection.
pub const CANCEL_COMMAND: &str = "CANCEL";

/// Body of a Task Queue message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionMessage {
    pub task_id: TaskId,
    /// Base64 (standard alphabet) encoded image bytes.
    pub encoded_image: String,
    pub style: String,
    pub intensity: f64,
}

/// Status event pushed to the client over the notification channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_image: Option<String>,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl TaskEvent {
    fn bare(status: TaskStatus) -> Self {
        Self {
            result_image: None,
            status,
            error_code: None,
            error_message: None,
        }
    }

    pub fn processing() -> Self {
        Self::bare(TaskStatus::Processing)
    }

    pub fn canceled() -> Self {
        Self::bare(TaskStatus::Canceled)
    }

    pub fn completed(result_image: String) -> Self {
        Self {
            result_image: Some(result_image),
            ..Self::bare(TaskStatus::Completed)
        }
    }

    pub fn failed(code: ErrorCode) -> Self {
        Self {
            error_code: Some(code.code()),
            error_message: Some(code.message().to_string()),
            ..Self::bare(TaskStatus::Failed)
        }
    }

    /// Whether the channel should be closed after this event is delivered.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
