//! Task CRUD operations and queries.
//!
//! Reordering, moving between plans and repacking live in
//! [`super::ordering`]; this file covers creation, plain updates, deletion
//! and the listing queries.

use std::sync::Arc;

use jiff::Timestamp;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{codec, keys, PlanStore};
use crate::{
    error::{PlannerError, Result, StorageResultExt},
    kv::KeyValue,
    models::{Task, TaskPriority, TaskStatus},
};

/// Description stored for bulk-created tasks that did not supply one.
pub const DEFAULT_DESCRIPTION: &str = "No description provided";

/// One element of a bulk create, as received from a caller.
///
/// `status` and `priority` are raw strings so unknown values can be reported
/// as validation errors; empty strings select the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: String,
}

/// CRUD, per-plan ordering and listing for tasks.
///
/// Holds a [`PlanStore`] only to check that plans exist.
#[derive(Clone)]
pub struct TaskStore {
    pub(super) kv: Arc<dyn KeyValue>,
    plans: PlanStore,
}

impl TaskStore {
    pub fn new(kv: Arc<dyn KeyValue>, plans: PlanStore) -> Self {
        Self { kv, plans }
    }

    /// Creates a task at the end of its plan's order.
    ///
    /// If the order-index insert fails the freshly written record is deleted
    /// again, so no unindexed record is left behind.
    pub fn create(
        &self,
        plan_id: &str,
        title: &str,
        description: &str,
        priority: TaskPriority,
    ) -> Result<Task> {
        validate_title("title", title)?;
        self.require_plan(plan_id)?;

        let order = self.sibling_count(plan_id)?;
        let now = Timestamp::now();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            plan_id: plan_id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            notes: String::new(),
            status: TaskStatus::Pending,
            priority,
            order,
            created_at: now,
            updated_at: now,
        };

        self.insert(&task)?;
        debug!("Created task {} in plan {plan_id} at order {order}", task.id);
        Ok(task)
    }

    /// Creates several tasks at the end of a plan, in input order.
    ///
    /// Every input is validated before anything is written. Once writing
    /// starts, a failure stops the sequence and is reported as a
    /// [`PlannerError::PartialFailure`] naming the failed input; tasks written
    /// before it stay in place.
    pub fn create_bulk(&self, plan_id: &str, inputs: &[NewTask]) -> Result<Vec<Task>> {
        self.require_plan(plan_id)?;

        let mut validated = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.iter().enumerate() {
            validate_title(&format!("tasks[{index}].title"), &input.title)?;
            let status = parse_or_default::<TaskStatus>(&format!("tasks[{index}].status"), &input.status)?;
            let priority =
                parse_or_default::<TaskPriority>(&format!("tasks[{index}].priority"), &input.priority)?;
            validated.push((input, status, priority));
        }

        let order_offset = self.sibling_count(plan_id)?;
        let now = Timestamp::now();
        let mut created = Vec::with_capacity(validated.len());

        for (index, (input, status, priority)) in validated.into_iter().enumerate() {
            let description = if input.description.trim().is_empty() {
                DEFAULT_DESCRIPTION.to_string()
            } else {
                input.description.clone()
            };
            let task = Task {
                id: Uuid::new_v4().to_string(),
                plan_id: plan_id.to_string(),
                title: input.title.clone(),
                description,
                notes: input.notes.clone(),
                status,
                priority,
                order: order_offset + index as u32,
                created_at: now,
                updated_at: now,
            };

            self.insert(&task).map_err(|e| {
                PlannerError::partial("bulk create", created.len(), format!("input {index}"), e)
            })?;
            created.push(task);
        }

        debug!("Created {} task(s) in plan {plan_id}", created.len());
        Ok(created)
    }

    /// Writes the record, then the index entry, removing the record if the
    /// index insert fails.
    fn insert(&self, task: &Task) -> Result<()> {
        let task_key = keys::task(&task.id);
        self.kv
            .hset(&task_key, &codec::task_fields(task))
            .kv_context_lazy(|| format!("Failed to write task {}", task.id))?;

        if let Err(e) = self
            .kv
            .zadd(&keys::plan_tasks(&task.plan_id), &task.id, codec::score(task.order))
        {
            warn!("Rolling back task {} after failed index insert", task.id);
            if let Err(cleanup) = self.kv.del(&task_key) {
                warn!("Could not remove task record {}: {cleanup}", task.id);
            }
            return Err(PlannerError::storage("Failed to index task").with_source(e));
        }
        Ok(())
    }

    /// Retrieves a task by its ID.
    pub fn get(&self, id: &str) -> Result<Task> {
        self.find(id)?
            .ok_or_else(|| PlannerError::TaskNotFound { id: id.to_string() })
    }

    pub(super) fn find(&self, id: &str) -> Result<Option<Task>> {
        let key = keys::task(id);
        let fields = self
            .kv
            .hgetall(&key)
            .kv_context_lazy(|| format!("Failed to read task {id}"))?;
        codec::decode_task(&key, fields)
    }

    /// Overwrites the full record and bumps `updated_at`.
    ///
    /// A different `plan_id` than the stored one turns the update into a move
    /// (see [`TaskStore::move_task`]). Otherwise `order`, `id` and
    /// `created_at` come from the stored record: only reorder and move change
    /// a task's position.
    pub fn update(&self, task: &Task) -> Result<Task> {
        validate_title("title", &task.title)?;
        let current = self.get(&task.id)?;

        if task.plan_id != current.plan_id {
            return self.move_task(&current, task);
        }

        let updated = Task {
            id: current.id,
            plan_id: current.plan_id,
            order: current.order,
            created_at: current.created_at,
            updated_at: Timestamp::now(),
            ..task.clone()
        };

        let key = keys::task(&updated.id);
        let present = self
            .kv
            .exists(&key)
            .kv_context_lazy(|| format!("Failed to check task {}", updated.id))?;
        if !present {
            return Err(PlannerError::TaskNotFound { id: updated.id });
        }
        self.kv
            .hset(&key, &codec::task_fields(&updated))
            .kv_context_lazy(|| format!("Failed to write task {}", updated.id))?;

        debug!("Updated task {}", updated.id);
        Ok(updated)
    }

    /// Deletes a task and closes the gap it leaves in its plan.
    pub fn delete(&self, id: &str) -> Result<()> {
        let task = self.get(id)?;

        self.kv
            .del(&keys::task(id))
            .kv_context_lazy(|| format!("Failed to delete task {id}"))?;

        self.kv
            .zrem(&keys::plan_tasks(&task.plan_id), id)
            .map_err(|e| {
                PlannerError::partial(
                    "task delete",
                    1,
                    "order-index entry",
                    PlannerError::storage("Failed to remove task from its plan").with_source(e),
                )
            })?;

        self.repack(&task.plan_id)
            .map_err(|e| PlannerError::partial("task delete", 2, "repack", e))?;

        debug!("Deleted task {id} from plan {}", task.plan_id);
        Ok(())
    }

    /// Tasks of a plan, ascending by order.
    pub fn list_by_plan(&self, plan_id: &str) -> Result<Vec<Task>> {
        self.require_plan(plan_id)?;
        self.ordered_tasks(plan_id)
    }

    /// Tasks with the given status across every live plan.
    ///
    /// This is an unindexed scan over every plan's ordered list and costs
    /// O(total tasks). Tasks of deleted plans are not visited.
    pub fn list_by_status(&self, status: TaskStatus) -> Result<Vec<Task>> {
        let mut plan_ids: Vec<String> = self.plans.live_ids()?.into_iter().collect();
        plan_ids.sort();

        let mut matching = Vec::new();
        for plan_id in plan_ids {
            matching.extend(
                self.ordered_tasks(&plan_id)?
                    .into_iter()
                    .filter(|task| task.status == status),
            );
        }
        Ok(matching)
    }

    /// Tasks of one plan with the given status, in plan order.
    pub fn list_by_plan_and_status(&self, plan_id: &str, status: TaskStatus) -> Result<Vec<Task>> {
        Ok(self
            .list_by_plan(plan_id)?
            .into_iter()
            .filter(|task| task.status == status)
            .collect())
    }

    /// Every task whose plan is no longer live, sorted by plan then order.
    ///
    /// Scans all task records. Records removed while the scan runs are
    /// skipped.
    pub fn list_orphaned(&self) -> Result<Vec<Task>> {
        let live = self.plans.live_ids()?;
        let task_keys = self
            .kv
            .scan_prefix(keys::TASK_PREFIX)
            .kv_context("Failed to scan task records")?;

        let mut orphans = Vec::new();
        for key in task_keys {
            let fields = self
                .kv
                .hgetall(&key)
                .kv_context_lazy(|| format!("Failed to read {key}"))?;
            if let Some(task) = codec::decode_task(&key, fields)? {
                if !live.contains(&task.plan_id) {
                    orphans.push(task);
                }
            }
        }

        orphans.sort_by(|a, b| {
            a.plan_id
                .cmp(&b.plan_id)
                .then(a.order.cmp(&b.order))
                .then_with(|| a.id.cmp(&b.id))
        });
        if !orphans.is_empty() {
            debug!("Found {} orphaned task(s)", orphans.len());
        }
        Ok(orphans)
    }

    /// Loads a plan's tasks in index order. An index member without a record
    /// is a consistency error.
    fn ordered_tasks(&self, plan_id: &str) -> Result<Vec<Task>> {
        let index_key = keys::plan_tasks(plan_id);
        let entries = self
            .kv
            .zrange_withscores(&index_key)
            .kv_context_lazy(|| format!("Failed to read task index of plan {plan_id}"))?;

        let mut tasks = Vec::with_capacity(entries.len());
        for (task_id, _) in entries {
            let task = self.find(&task_id)?.ok_or_else(|| {
                PlannerError::consistency(format!("{index_key} lists task {task_id} but it has no record"))
            })?;
            tasks.push(task);
        }
        Ok(tasks)
    }

    /// Number of tasks currently indexed under a plan.
    pub fn sibling_count(&self, plan_id: &str) -> Result<u32> {
        let count = self
            .kv
            .zcard(&keys::plan_tasks(plan_id))
            .kv_context_lazy(|| format!("Failed to count tasks of plan {plan_id}"))?;
        Ok(count as u32)
    }

    pub(crate) fn require_plan(&self, plan_id: &str) -> Result<()> {
        if self.plans.exists(plan_id)? {
            Ok(())
        } else {
            Err(PlannerError::PlanNotFound {
                id: plan_id.to_string(),
            })
        }
    }
}

fn validate_title(field: &str, title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(PlannerError::invalid_input(field).with_reason("Title is required"));
    }
    Ok(())
}

fn parse_or_default<T>(field: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr<Err = String> + Default,
{
    if value.trim().is_empty() {
        return Ok(T::default());
    }
    value
        .trim()
        .parse::<T>()
        .map_err(|reason| PlannerError::invalid_input(field).with_reason(reason))
}
