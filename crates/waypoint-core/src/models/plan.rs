//! Plan model definition.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::PlanStatus;

/// A plan: the container tasks are ordered within.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Unique identifier for the plan (UUID v4)
    pub id: String,

    /// Opaque grouping key; plans are indexed per application
    pub application_id: String,

    /// Short name of the plan
    pub name: String,

    /// Longer description of the plan
    pub description: String,

    /// Free-form markdown notes, already passed through the notes pipeline
    #[serde(default)]
    pub notes: String,

    /// Status of the plan. Records written before the field existed load as
    /// [`PlanStatus::New`].
    #[serde(default)]
    pub status: PlanStatus,

    /// Timestamp when the plan was created (UTC)
    pub created_at: Timestamp,

    /// Timestamp when the plan was last modified (UTC)
    pub updated_at: Timestamp,
}
