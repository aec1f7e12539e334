//! Async planner facade over the plan and task stores.
//!
//! The stores are synchronous and talk to the backend directly. The
//! [`Planner`] wraps them for async callers:
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │     Planner     │    │  PlanStore /    │    │    KeyValue     │
//! │ (params, notes, │───▶│  TaskStore      │───▶│ (memory, sqlite │
//! │  deadlines)     │    │  (sync)         │    │  or redis)      │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! Each call parses its params, runs notes through [`crate::notes::prepare`],
//! then executes the store call on tokio's blocking pool, optionally bounded
//! by the deadline set with [`PlannerBuilder::with_timeout`].
//!
//! ## Submodules
//!
//! - [`builder`]: backend selection and construction
//! - [`plan_ops`]: plan operations
//! - [`task_ops`]: task operations
//!
//! # Examples
//!
//! ```rust
//! use waypoint_core::{
//!     params::{CreatePlan, CreateTask, ReorderTask},
//!     PlannerBuilder,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let planner = PlannerBuilder::new().in_memory().build().await?;
//!
//! let plan = planner
//!     .create_plan(&CreatePlan {
//!         application_id: "acme".to_string(),
//!         name: "Launch".to_string(),
//!         description: None,
//!     })
//!     .await?;
//!
//! let task = planner
//!     .add_task(&CreateTask {
//!         plan_id: plan.id.clone(),
//!         title: "Write announcement".to_string(),
//!         ..CreateTask::default()
//!     })
//!     .await?;
//! assert_eq!(task.order, 0);
//!
//! planner
//!     .reorder_task(&ReorderTask { id: task.id, order: 0 })
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tokio::task;

use crate::{
    error::{PlannerError, Result},
    store::{PlanStore, TaskStore},
};

pub mod builder;
pub mod plan_ops;
pub mod task_ops;


pub use builder::PlannerBuilder;

/// Main planner interface for managing plans and tasks.
#[derive(Clone)]
pub struct Planner {
    plans: PlanStore,
    tasks: TaskStore,
    timeout: Option<Duration>,
}

impl Planner {
    pub(crate) fn new(plans: PlanStore, tasks: TaskStore, timeout: Option<Duration>) -> Self {
        Self {
            plans,
            tasks,
            timeout,
        }
    }

    /// The synchronous plan store, for callers that manage their own threads.
    pub fn plan_store(&self) -> &PlanStore {
        &self.plans
    }

    /// The synchronous task store, for callers that manage their own threads.
    pub fn task_store(&self) -> &TaskStore {
        &self.tasks
    }

    /// Runs a store call on the blocking pool, applying the deadline.
    ///
    /// A call that times out keeps running in the background; whatever it
    /// leaves half done is repaired by the next repack of the affected plan.
    async fn run<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&PlanStore, &TaskStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let plans = self.plans.clone();
        let tasks = self.tasks.clone();
        let handle = task::spawn_blocking(move || f(&plans, &tasks));

        let joined = match self.timeout {
            Some(after) => tokio::time::timeout(after, handle)
                .await
                .map_err(|_| PlannerError::Timeout { operation, after })?,
            None => handle.await,
        };

        joined.map_err(|e| PlannerError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }
}
