//! Task model definition.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{TaskPriority, TaskStatus};

/// An individual task within a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task (UUID v4)
    pub id: String,

    /// ID of the plan the task belongs to. Checked on creation and on move
    /// only; the plan may disappear later.
    pub plan_id: String,

    /// Brief title of the task
    pub title: String,

    /// Detailed description of the task
    pub description: String,

    /// Free-form markdown notes
    #[serde(default)]
    pub notes: String,

    /// Current status of the task
    #[serde(default)]
    pub status: TaskStatus,

    /// Priority of the task
    #[serde(default)]
    pub priority: TaskPriority,

    /// Zero-based position of the task within its plan
    pub order: u32,

    /// Timestamp when the task was created (UTC)
    pub created_at: Timestamp,

    /// Timestamp when the task was last updated (UTC)
    pub updated_at: Timestamp,
}
