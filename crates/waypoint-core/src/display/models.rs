//! Display implementations for domain models.
//!
//! Everything renders as markdown so the CLI can print it directly.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::models::{Plan, PlanStatus, Task, TaskPriority, TaskStatus};

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}", self.name)?;
        writeln!(f)?;

        writeln!(f, "- ID: {}", self.id)?;
        writeln!(f, "- Application: {}", self.application_id)?;
        writeln!(f, "- Status: {}", self.status.as_str())?;
        writeln!(f, "- Created: {}", LocalDateTime(&self.created_at))?;
        writeln!(f, "- Updated: {}", LocalDateTime(&self.updated_at))?;

        if !self.description.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", self.description)?;
        }

        if !self.notes.is_empty() {
            writeln!(f)?;
            writeln!(f, "## Notes")?;
            writeln!(f)?;
            write!(f, "{}", self.notes)?;
            if !self.notes.ends_with('\n') {
                writeln!(f)?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "### {}. {} ({})",
            self.order,
            self.title,
            self.status.with_icon()
        )?;
        writeln!(f)?;
        writeln!(f, "- ID: {}", self.id)?;
        writeln!(f, "- Priority: {}", self.priority.as_str())?;
        writeln!(f)?;

        if !self.description.is_empty() {
            writeln!(f, "{}", self.description)?;
            writeln!(f)?;
        }

        if !self.notes.is_empty() {
            writeln!(f, "#### Notes")?;
            writeln!(f)?;
            write!(f, "{}", self.notes)?;
            if !self.notes.ends_with('\n') {
                writeln!(f)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
