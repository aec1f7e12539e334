//! Plan and task persistence on top of [`KeyValue`] primitives.
//!
//! # Key layout
//!
//! | Key                     | Type       | Contents                              |
//! |-------------------------|------------|---------------------------------------|
//! | `plan:<planId>`         | hash       | plan record                           |
//! | `plans`                 | set        | all live plan ids                     |
//! | `app:<appId>:plans`     | set        | plan ids of one application           |
//! | `task:<taskId>`         | hash       | task record, `order` as decimal text  |
//! | `plan_tasks:<planId>`   | sorted set | task ids scored by order              |
//!
//! # Consistency model
//!
//! Each key-value call is atomic but nothing spans keys. Mutations are
//! written as short sequences of calls ordered so that a crash between any
//! two of them leaves state the next mutation can repair:
//!
//! - records are written before their index entries, and index entries are
//!   removed after their records, so an index never *gains* a dangling member
//!   outside the window of a single call sequence;
//! - every task mutation that can open a gap in a plan's ordering ends with
//!   [`TaskStore::repack`], which only rewrites entries that disagree with
//!   their position and is therefore safe to run any number of times.
//!
//! Concurrent callers may observe duplicated or missing orders between those
//! two points. The next mutating call on the plan heals them.
//!
//! Writes to an existing record check that the record is still there right
//! before writing, and renumbering skips and unindexes records that have
//! been deleted, so a racing delete is not undone. The check and the write
//! are still two calls: a delete landing between them can leave a record
//! outside its sets or index, which then lists as an orphan.

use std::sync::Arc;

use crate::kv::KeyValue;

mod codec;
pub mod ordering;
pub mod plan_store;
pub mod task_store;

pub use plan_store::PlanStore;
pub use task_store::{NewTask, TaskStore};

/// Key builders for the persisted layout.
pub mod keys {
    /// Set of every live plan id.
    pub const PLANS: &str = "plans";

    /// Prefix shared by every task record key.
    pub const TASK_PREFIX: &str = "task:";

    pub fn plan(plan_id: &str) -> String {
        format!("plan:{plan_id}")
    }

    pub fn app_plans(application_id: &str) -> String {
        format!("app:{application_id}:plans")
    }

    pub fn task(task_id: &str) -> String {
        format!("{TASK_PREFIX}{task_id}")
    }

    pub fn plan_tasks(plan_id: &str) -> String {
        format!("plan_tasks:{plan_id}")
    }
}

/// Builds both stores over one shared backend.
pub fn open_stores(kv: Arc<dyn KeyValue>) -> (PlanStore, TaskStore) {
    let plans = PlanStore::new(Arc::clone(&kv));
    let tasks = TaskStore::new(kv, plans.clone());
    (plans, tasks)
}

#[cfg(test)]
mod tests {
    use super::keys;

    #[test]
    fn test_key_layout() {
        assert_eq!(keys::plan("p1"), "plan:p1");
        assert_eq!(keys::app_plans("acme"), "app:acme:plans");
        assert_eq!(keys::task("t1"), "task:t1");
        assert_eq!(keys::plan_tasks("p1"), "plan_tasks:p1");
        assert_eq!(keys::PLANS, "plans");
    }
}
