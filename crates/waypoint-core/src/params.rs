//! Parameter structures for planner operations.
//!
//! These are the request shapes accepted by the [`Planner`](crate::Planner).
//! They only derive serde, so any interface layer (the CLI, a JSON file, a
//! future RPC surface) can build them without pulling in its own framework
//! types. Enum-valued fields are carried as strings and parsed by the
//! `validate` methods, so an unknown value surfaces as
//! [`PlannerError::InvalidInput`] naming the field.
//!
//! ```rust
//! use waypoint_core::params::UpdateTask;
//!
//! let params = UpdateTask {
//!     id: "t-1".to_string(),
//!     status: Some("completed".to_string()),
//!     ..UpdateTask::default()
//! };
//! let (status, priority) = params.validate()?;
//! assert!(status.is_some() && priority.is_none());
//! # Ok::<(), waypoint_core::PlannerError>(())
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use crate::store::NewTask;
use crate::{
    error::{PlannerError, Result},
    models::{PlanStatus, TaskPriority, TaskStatus},
};

/// Parameters for operations requiring just an ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Id {
    /// The ID of the plan or task to operate on
    pub id: String,
}

/// Parameters for creating a new plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePlan {
    /// Application the plan is grouped under (required)
    pub application_id: String,
    /// Name of the plan (required)
    pub name: String,
    /// Optional longer description
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update of a plan. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePlan {
    /// Plan ID to update (required)
    pub id: String,
    pub application_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Replacement notes, run through the notes pipeline before storing
    pub notes: Option<String>,
    /// New status ('new', 'inprogress', 'completed' or 'cancelled')
    pub status: Option<String>,
}

impl UpdatePlan {
    /// Parses the optional status.
    pub fn validate(&self) -> Result<Option<PlanStatus>> {
        parse_optional("status", self.status.as_deref())
    }
}

/// Parameters for a status-only plan update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePlanStatus {
    pub id: String,
    pub status: String,
}

impl UpdatePlanStatus {
    pub fn validate(&self) -> Result<PlanStatus> {
        parse_required("status", &self.status)
    }
}

/// Filters for listing plans. Both filters may be combined.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPlans {
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ListPlans {
    pub fn validate(&self) -> Result<Option<PlanStatus>> {
        parse_optional("status", self.status.as_deref())
    }
}

/// Parameters for appending a single task to a plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTask {
    /// Plan to append the task to
    pub plan_id: String,
    /// Title of the task (required)
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// 'low', 'medium' or 'high'; defaults to medium
    #[serde(default)]
    pub priority: Option<String>,
}

impl CreateTask {
    pub fn validate(&self) -> Result<TaskPriority> {
        Ok(parse_optional("priority", self.priority.as_deref())?.unwrap_or_default())
    }
}

/// Parameters for appending several tasks to a plan in one call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTasks {
    pub plan_id: String,
    pub tasks: Vec<NewTask>,
}

/// Partial update of a task. `None` fields keep their stored value.
///
/// A `plan_id` different from the stored one moves the task to the end of
/// that plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    /// Task ID to update (required)
    pub id: String,
    pub plan_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    /// 'pending', 'in_progress', 'completed' or 'cancelled'
    pub status: Option<String>,
    /// 'low', 'medium' or 'high'
    pub priority: Option<String>,
}

impl UpdateTask {
    /// Parses the optional status and priority.
    pub fn validate(&self) -> Result<(Option<TaskStatus>, Option<TaskPriority>)> {
        Ok((
            parse_optional("status", self.status.as_deref())?,
            parse_optional("priority", self.priority.as_deref())?,
        ))
    }
}

/// Parameters for moving a task to a new position within its plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReorderTask {
    pub id: String,
    /// Zero-based target position. Signed so out-of-range input reaches
    /// validation instead of failing to parse.
    pub order: i64,
}

/// Filters for listing tasks. At least one filter is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListTasks {
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ListTasks {
    pub fn validate(&self) -> Result<Option<TaskStatus>> {
        if self.plan_id.is_none() && self.status.is_none() {
            return Err(PlannerError::invalid_input("plan_id")
                .with_reason("Either a plan ID or a status filter is required"));
        }
        parse_optional("status", self.status.as_deref())
    }
}

fn parse_optional<T>(field: &str, value: Option<&str>) -> Result<Option<T>>
where
    T: FromStr<Err = String>,
{
    value.map(|v| parse_required(field, v)).transpose()
}

fn parse_required<T>(field: &str, value: &str) -> Result<T>
where
    T: FromStr<Err = String>,
{
    T::from_str(value.trim()).map_err(|reason| PlannerError::invalid_input(field).with_reason(reason))
}
