//! Data models for plans and tasks.
//!
//! The models are plain data: persistence lives in [`crate::store`], which
//! maps them onto key-value hashes, and markdown rendering lives in
//! [`crate::display`]. Every model derives serde with camelCase field names
//! so upward consumers can emit JSON directly.
//!
//! # Examples
//!
//! ```rust
//! use waypoint_core::models::{Task, TaskPriority, TaskStatus};
//! use jiff::Timestamp;
//!
//! let task = Task {
//!     id: "t-1".to_string(),
//!     plan_id: "p-1".to_string(),
//!     title: "Write migration".to_string(),
//!     description: "Move the legacy rows".to_string(),
//!     notes: String::new(),
//!     status: TaskStatus::InProgress,
//!     priority: TaskPriority::High,
//!     order: 0,
//!     created_at: Timestamp::now(),
//!     updated_at: Timestamp::now(),
//! };
//! println!("{}", task); // Shows ➤ In Progress status icon
//! ```

pub mod plan;
pub mod status;
pub mod task;


pub use plan::Plan;
pub use status::{PlanStatus, TaskPriority, TaskStatus};
pub use task::Task;
