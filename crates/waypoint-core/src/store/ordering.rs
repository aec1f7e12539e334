//! Per-plan task ordering: reorder, cross-plan moves and repacking.
//!
//! A plan's tasks hold orders `0..n` with no gaps or duplicates, and the
//! order-index score of each task equals its stored `order`. Every operation
//! here ends by calling [`TaskStore::repack`], which restores that invariant
//! for whatever the earlier steps (or an earlier crash) left behind.

use jiff::Timestamp;
use log::{debug, warn};

use super::{codec, keys, TaskStore};
use crate::{
    error::{PlannerError, Result, StorageResultExt},
    models::Task,
};

/// Live index members with their scores, and ids to drop from the index.
type Resolved = (Vec<(Task, f64)>, Vec<String>);

impl TaskStore {
    /// Moves a task to `new_order` within its plan.
    ///
    /// Siblings between the old and new position shift one step toward the
    /// vacated slot, then the task takes the target slot. Returns the task as
    /// stored afterwards.
    ///
    /// Positions are counted over live members only: index entries without a
    /// record, or whose record names another plan, are neither counted nor
    /// shifted, and are dropped from the index once the request is valid.
    pub fn reorder(&self, id: &str, new_order: i64) -> Result<Task> {
        let task = self.get(id)?;
        let index_key = keys::plan_tasks(&task.plan_id);
        let (live, stale) = self.resolve(&task.plan_id, &index_key)?;

        let count = live.len();
        if new_order < 0 || new_order >= count as i64 {
            return Err(PlannerError::invalid_input("order").with_reason(format!(
                "Order {new_order} is out of range, plan has {count} task(s)"
            )));
        }
        let new_position = new_order as usize;

        let old_position = live
            .iter()
            .position(|(member, _)| member.id == id)
            .ok_or_else(|| {
                PlannerError::consistency(format!("Task {id} is missing from {index_key}"))
            })?;

        if new_position == old_position {
            return Ok(task);
        }

        for task_id in &stale {
            self.prune(&index_key, task_id)?;
        }

        let shifted: Vec<(&str, usize)> = if new_position > old_position {
            live[old_position + 1..=new_position]
                .iter()
                .enumerate()
                .map(|(offset, (member, _))| (member.id.as_str(), old_position + offset))
                .collect()
        } else {
            live[new_position..old_position]
                .iter()
                .enumerate()
                .map(|(offset, (member, _))| (member.id.as_str(), new_position + offset + 1))
                .collect()
        };

        for (done, (member, order)) in shifted.iter().enumerate() {
            self.write_order(&task.plan_id, member, *order as u32, None)
                .map_err(|e| PlannerError::partial("reorder", done, format!("task {member}"), e))?;
        }

        let written = self
            .write_order(
                &task.plan_id,
                id,
                new_position as u32,
                Some(Timestamp::now()),
            )
            .map_err(|e| PlannerError::partial("reorder", shifted.len(), format!("task {id}"), e))?;
        if !written {
            return Err(PlannerError::TaskNotFound { id: id.to_string() });
        }

        self.repack(&task.plan_id)
            .map_err(|e| PlannerError::partial("reorder", shifted.len() + 1, "repack", e))?;

        debug!(
            "Reordered task {id} in plan {} from {old_position} to {new_position}",
            task.plan_id
        );
        self.get(id)
    }

    /// Rewrites a plan's orders to `0..n` following the current index order.
    ///
    /// Only entries whose score or stored order disagree with their position
    /// are written, so a second call is a no-op. Index members without a
    /// record, or whose record belongs to another plan, are dropped from the
    /// index. Returns how many tasks were rewritten.
    pub fn repack(&self, plan_id: &str) -> Result<usize> {
        let index_key = keys::plan_tasks(plan_id);
        let (live, stale) = self.resolve(plan_id, &index_key)?;
        for task_id in &stale {
            self.prune(&index_key, task_id)?;
        }

        let mut position: u32 = 0;
        let mut rewritten = 0;
        for (task, score) in live {
            if task.order != position || score != codec::score(position) {
                if !self.write_order(plan_id, &task.id, position, None)? {
                    continue;
                }
                rewritten += 1;
            }
            position += 1;
        }

        if rewritten > 0 {
            debug!("Repacked plan {plan_id}: {rewritten} task(s) renumbered");
        }
        Ok(rewritten)
    }

    /// Moves `current` to `requested.plan_id`, appending it there, and closes
    /// the gap in the old plan.
    ///
    /// Called from [`TaskStore::update`] with the caller's field values in
    /// `requested`.
    pub(super) fn move_task(&self, current: &Task, requested: &Task) -> Result<Task> {
        let old_plan = &current.plan_id;
        let new_plan = &requested.plan_id;
        self.require_plan(new_plan)?;

        let moved = Task {
            id: current.id.clone(),
            order: self.sibling_count(new_plan)?,
            created_at: current.created_at,
            updated_at: Timestamp::now(),
            ..requested.clone()
        };

        self.kv
            .hset(&keys::task(&moved.id), &codec::task_fields(&moved))
            .kv_context_lazy(|| format!("Failed to write task {}", moved.id))?;

        self.kv
            .zrem(&keys::plan_tasks(old_plan), &moved.id)
            .map_err(|e| {
                PlannerError::partial(
                    "task move",
                    1,
                    format!("leaving plan {old_plan}"),
                    PlannerError::storage("Failed to remove task from its old plan").with_source(e),
                )
            })?;

        self.kv
            .zadd(&keys::plan_tasks(new_plan), &moved.id, codec::score(moved.order))
            .map_err(|e| {
                PlannerError::partial(
                    "task move",
                    2,
                    format!("joining plan {new_plan}"),
                    PlannerError::storage("Failed to add task to its new plan").with_source(e),
                )
            })?;

        self.repack(old_plan)
            .map_err(|e| PlannerError::partial("task move", 3, format!("repack of plan {old_plan}"), e))?;

        debug!(
            "Moved task {} from plan {old_plan} to plan {new_plan} at order {}",
            moved.id, moved.order
        );
        Ok(moved)
    }

    /// Reads a plan's index in score order and loads each member's record.
    ///
    /// Returns the members whose record exists and still names `plan_id`,
    /// with their scores, and separately the ids that should be dropped from
    /// the index.
    fn resolve(&self, plan_id: &str, index_key: &str) -> Result<Resolved> {
        let entries = self
            .kv
            .zrange_withscores(index_key)
            .kv_context_lazy(|| format!("Failed to read task index of plan {plan_id}"))?;

        let mut live = Vec::with_capacity(entries.len());
        let mut stale = Vec::new();
        for (task_id, score) in entries {
            match self.find(&task_id)? {
                Some(task) if task.plan_id == plan_id => live.push((task, score)),
                Some(task) => {
                    warn!(
                        "Dropping {task_id} from {index_key}: task now belongs to plan {}",
                        task.plan_id
                    );
                    stale.push(task_id);
                }
                None => {
                    warn!("Dropping {task_id} from {index_key}: no task record");
                    stale.push(task_id);
                }
            }
        }
        Ok((live, stale))
    }

    /// Writes one task's order to both its record and the plan's index.
    ///
    /// A record that has vanished since it was read is not recreated: its
    /// index entry is dropped instead and `false` is returned.
    fn write_order(
        &self,
        plan_id: &str,
        task_id: &str,
        order: u32,
        touched: Option<Timestamp>,
    ) -> Result<bool> {
        let index_key = keys::plan_tasks(plan_id);
        let record_key = keys::task(task_id);
        let present = self
            .kv
            .exists(&record_key)
            .kv_context_lazy(|| format!("Failed to check task {task_id}"))?;
        if !present {
            warn!("Dropping {task_id} from {index_key}: record deleted during renumbering");
            self.prune(&index_key, task_id)?;
            return Ok(false);
        }

        let mut fields = vec![("order", order.to_string())];
        if let Some(at) = touched {
            fields.push(("updated_at", at.to_string()));
        }

        self.kv
            .hset(&record_key, &fields)
            .kv_context_lazy(|| format!("Failed to write order of task {task_id}"))?;
        self.kv
            .zadd(&index_key, task_id, codec::score(order))
            .kv_context_lazy(|| format!("Failed to index order of task {task_id}"))?;
        Ok(true)
    }

    fn prune(&self, index_key: &str, task_id: &str) -> Result<()> {
        self.kv
            .zrem(index_key, task_id)
            .kv_context_lazy(|| format!("Failed to drop {task_id} from {index_key}"))
    }
}
