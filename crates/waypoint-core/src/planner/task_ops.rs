//! Task operations for the Planner.

use super::Planner;
use crate::{
    error::Result,
    models::Task,
    notes,
    params::{CreateTask, CreateTasks, Id, ListTasks, ReorderTask, UpdateTask},
    store::NewTask,
};

impl Planner {
    /// Appends a task to the end of a plan.
    pub async fn add_task(&self, params: &CreateTask) -> Result<Task> {
        let priority = params.validate()?;
        let plan_id = params.plan_id.clone();
        let title = params.title.clone();
        let description = params.description.clone().unwrap_or_default();

        self.run("add task", move |_, tasks| {
            tasks.create(&plan_id, &title, &description, priority)
        })
        .await
    }

    /// Appends several tasks in input order. Notes of every input are
    /// prepared before anything is written.
    pub async fn add_tasks(&self, params: &CreateTasks) -> Result<Vec<Task>> {
        let inputs = params
            .tasks
            .iter()
            .map(|input| {
                Ok(NewTask {
                    notes: notes::prepare(&input.notes)?,
                    ..input.clone()
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let plan_id = params.plan_id.clone();

        self.run("add tasks", move |_, tasks| tasks.create_bulk(&plan_id, &inputs))
            .await
    }

    /// Retrieves a task by its ID.
    pub async fn get_task(&self, params: &Id) -> Result<Task> {
        let id = params.id.clone();
        self.run("get task", move |_, tasks| tasks.get(&id)).await
    }

    /// Applies a partial update; a new `plan_id` moves the task.
    pub async fn update_task(&self, params: &UpdateTask) -> Result<Task> {
        let (status, priority) = params.validate()?;
        let notes = params.notes.as_deref().map(notes::prepare).transpose()?;
        let params = params.clone();

        self.run("update task", move |_, tasks| {
            let mut task = tasks.get(&params.id)?;
            if let Some(plan_id) = params.plan_id {
                task.plan_id = plan_id;
            }
            if let Some(title) = params.title {
                task.title = title;
            }
            if let Some(description) = params.description {
                task.description = description;
            }
            if let Some(notes) = notes {
                task.notes = notes;
            }
            if let Some(status) = status {
                task.status = status;
            }
            if let Some(priority) = priority {
                task.priority = priority;
            }
            tasks.update(&task)
        })
        .await
    }

    /// Deletes a task, returning it as it was before deletion.
    pub async fn delete_task(&self, params: &Id) -> Result<Task> {
        let id = params.id.clone();
        self.run("delete task", move |_, tasks| {
            let task = tasks.get(&id)?;
            tasks.delete(&id)?;
            Ok(task)
        })
        .await
    }

    /// Moves a task to a new position within its plan.
    pub async fn reorder_task(&self, params: &ReorderTask) -> Result<Task> {
        let id = params.id.clone();
        let order = params.order;
        self.run("reorder task", move |_, tasks| tasks.reorder(&id, order))
            .await
    }

    /// Lists tasks by plan, by status across live plans, or both.
    pub async fn list_tasks(&self, params: &ListTasks) -> Result<Vec<Task>> {
        let status = params.validate()?;
        let plan_id = params.plan_id.clone();

        self.run("list tasks", move |_, tasks| match (plan_id, status) {
            (Some(plan_id), Some(status)) => tasks.list_by_plan_and_status(&plan_id, status),
            (Some(plan_id), None) => tasks.list_by_plan(&plan_id),
            (None, Some(status)) => tasks.list_by_status(status),
            (None, None) => Ok(Vec::new()),
        })
        .await
    }

    /// Tasks whose plan no longer exists.
    pub async fn list_orphaned_tasks(&self) -> Result<Vec<Task>> {
        self.run("list orphaned tasks", |_, tasks| tasks.list_orphaned())
            .await
    }

    /// Renumbers a plan's tasks to `0..n`, returning how many changed.
    pub async fn repack_plan(&self, params: &Id) -> Result<usize> {
        let id = params.id.clone();
        self.run("repack plan", move |_, tasks| {
            tasks.require_plan(&id)?;
            tasks.repack(&id)
        })
        .await
    }
}
