//! Markdown formatting for plans, tasks and operation results.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! the wrappers here add the context a single record does not carry:
//!
//! - [`collections`]: list wrappers ([`Plans`], [`Tasks`]) with empty-list
//!   handling
//! - [`results`]: create, update and delete confirmations
//! - [`status`]: one-line success or failure messages
//! - [`datetime`]: local-time rendering of stored UTC timestamps
//!
//! ```rust
//! use waypoint_core::display::OperationStatus;
//!
//! let status = OperationStatus::success("Repacked plan p-1: 2 task(s) renumbered");
//! assert!(status.to_string().starts_with("Success:"));
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;
pub mod status;

pub use collections::{Plans, Tasks};
pub use datetime::LocalDateTime;
pub use results::{CreateResult, DeleteResult, UpdateResult};
pub use status::OperationStatus;
