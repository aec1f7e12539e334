//! Core library for the Waypoint plan and task ordering engine.
//!
//! Plans group tasks; each plan keeps its tasks in a dense zero-based order
//! that survives concurrent creates, deletes, moves and reorders. Everything
//! is persisted as plain key-value primitives (hashes, sets, sorted sets) so
//! the same engine runs on an in-process map, a SQLite file or Redis.
//!
//! # Layers
//!
//! - [`kv`]: the [`KeyValue`](kv::KeyValue) trait and its backends
//! - [`store`]: [`PlanStore`] and [`TaskStore`], synchronous and
//!   self-healing; the only code that touches the key layout
//! - [`notes`]: validation and normalisation of markdown notes
//! - [`planner`]: the async [`Planner`] facade the CLI drives
//! - [`models`] and [`display`]: serde models and their markdown rendering
//!
//! # Quick Start
//!
//! ```rust
//! use waypoint_core::{
//!     params::{CreatePlan, CreateTask, ListTasks},
//!     PlannerBuilder,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let planner = PlannerBuilder::new()
//!     .with_database_path(Some("waypoint-example.db"))
//!     .build()
//!     .await?;
//!
//! let plan = planner
//!     .create_plan(&CreatePlan {
//!         application_id: "acme".to_string(),
//!         name: "My Project".to_string(),
//!         description: Some("A test project".to_string()),
//!     })
//!     .await?;
//! println!("Created plan: {}", plan);
//!
//! planner
//!     .add_task(&CreateTask {
//!         plan_id: plan.id.clone(),
//!         title: "First task".to_string(),
//!         ..CreateTask::default()
//!     })
//!     .await?;
//!
//! let tasks = planner
//!     .list_tasks(&ListTasks {
//!         plan_id: Some(plan.id),
//!         status: None,
//!     })
//!     .await?;
//! for task in &tasks {
//!     println!("{}. {}", task.order, task.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod display;
pub mod error;
pub mod kv;
pub mod models;
pub mod notes;
pub mod params;
pub mod planner;
pub mod store;

// Re-export commonly used types
pub use display::{CreateResult, DeleteResult, OperationStatus, Plans, Tasks, UpdateResult};
pub use error::{ErrorKind, PlannerError, Result};
pub use models::{Plan, PlanStatus, Task, TaskPriority, TaskStatus};
pub use params::{
    CreatePlan, CreateTask, CreateTasks, Id, ListPlans, ListTasks, ReorderTask, UpdatePlan,
    UpdatePlanStatus, UpdateTask,
};
pub use planner::{Planner, PlannerBuilder};
pub use store::{NewTask, PlanStore, TaskStore};
