//! Collection wrapper types for displaying groups of domain objects.

use std::{fmt, ops::Deref};

use super::datetime::LocalDateTime;
use crate::models::{Plan, Task};

/// Newtype wrapper for displaying a list of plans as compact summaries.
///
/// # Examples
///
/// ```rust
/// use waypoint_core::{
///     display::Plans,
///     models::{Plan, PlanStatus},
/// };
/// use jiff::Timestamp;
///
/// let plan = Plan {
///     id: "p-1".to_string(),
///     application_id: "acme".to_string(),
///     name: "Release 2.0".to_string(),
///     description: "Everything for the release".to_string(),
///     notes: String::new(),
///     status: PlanStatus::New,
///     created_at: Timestamp::now(),
///     updated_at: Timestamp::now(),
/// };
///
/// let output = format!("{}", Plans(vec![plan]));
/// assert!(output.contains("## Release 2.0 (ID: p-1)"));
/// ```
pub struct Plans(pub Vec<Plan>);

impl Deref for Plans {
    type Target = [Plan];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl IntoIterator for Plans {
    type Item = Plan;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Plans {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No plans found.");
        }

        for plan in &self.0 {
            writeln!(f, "## {} (ID: {})", plan.name, plan.id)?;
            writeln!(f)?;
            writeln!(f, "- **Application**: {}", plan.application_id)?;
            writeln!(f, "- **Status**: {}", plan.status)?;
            if !plan.description.is_empty() {
                writeln!(f, "- **Description**: {}", plan.description)?;
            }
            writeln!(f, "- **Created**: {}", LocalDateTime(&plan.created_at))?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Newtype wrapper for displaying tasks in the order given.
pub struct Tasks(pub Vec<Task>);

impl Deref for Tasks {
    type Target = [Task];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl IntoIterator for Tasks {
    type Item = Task;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Tasks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            writeln!(f, "No tasks found.")
        } else {
            for task in &self.0 {
                write!(f, "{}", task)?;
            }
            Ok(())
        }
    }
}
