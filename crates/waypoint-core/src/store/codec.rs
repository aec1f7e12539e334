//! Mapping between models and their hash records.

use std::collections::HashMap;

use jiff::Timestamp;

use crate::{
    error::{PlannerError, Result},
    models::{Plan, PlanStatus, Task, TaskPriority, TaskStatus},
};

pub(crate) fn plan_fields(plan: &Plan) -> Vec<(&'static str, String)> {
    vec![
        ("id", plan.id.clone()),
        ("application_id", plan.application_id.clone()),
        ("name", plan.name.clone()),
        ("description", plan.description.clone()),
        ("notes", plan.notes.clone()),
        ("status", plan.status.as_str().to_string()),
        ("created_at", plan.created_at.to_string()),
        ("updated_at", plan.updated_at.to_string()),
    ]
}

pub(crate) fn task_fields(task: &Task) -> Vec<(&'static str, String)> {
    vec![
        ("id", task.id.clone()),
        ("plan_id", task.plan_id.clone()),
        ("title", task.title.clone()),
        ("description", task.description.clone()),
        ("notes", task.notes.clone()),
        ("status", task.status.as_str().to_string()),
        ("priority", task.priority.as_str().to_string()),
        ("order", task.order.to_string()),
        ("created_at", task.created_at.to_string()),
        ("updated_at", task.updated_at.to_string()),
    ]
}

/// Score stored in a plan's order-index for a given order.
pub(crate) fn score(order: u32) -> f64 {
    f64::from(order)
}

/// Decodes a plan hash. An empty hash means the key does not exist.
pub(crate) fn decode_plan(key: &str, mut fields: HashMap<String, String>) -> Result<Option<Plan>> {
    if fields.is_empty() {
        return Ok(None);
    }

    Ok(Some(Plan {
        id: required(key, &mut fields, "id")?,
        application_id: fields.remove("application_id").unwrap_or_default(),
        name: fields.remove("name").unwrap_or_default(),
        description: fields.remove("description").unwrap_or_default(),
        notes: fields.remove("notes").unwrap_or_default(),
        status: optional_enum::<PlanStatus>(key, &mut fields, "status")?.unwrap_or_default(),
        created_at: timestamp(key, &mut fields, "created_at")?,
        updated_at: timestamp(key, &mut fields, "updated_at")?,
    }))
}

/// Decodes a task hash. An empty hash means the key does not exist.
pub(crate) fn decode_task(key: &str, mut fields: HashMap<String, String>) -> Result<Option<Task>> {
    if fields.is_empty() {
        return Ok(None);
    }

    let order_text = required(key, &mut fields, "order")?;
    let order = order_text.trim().parse::<u32>().map_err(|_| {
        PlannerError::consistency(format!("{key}: order '{order_text}' is not a non-negative integer"))
    })?;

    Ok(Some(Task {
        id: required(key, &mut fields, "id")?,
        plan_id: required(key, &mut fields, "plan_id")?,
        title: fields.remove("title").unwrap_or_default(),
        description: fields.remove("description").unwrap_or_default(),
        notes: fields.remove("notes").unwrap_or_default(),
        status: optional_enum::<TaskStatus>(key, &mut fields, "status")?.unwrap_or_default(),
        priority: optional_enum::<TaskPriority>(key, &mut fields, "priority")?.unwrap_or_default(),
        order,
        created_at: timestamp(key, &mut fields, "created_at")?,
        updated_at: timestamp(key, &mut fields, "updated_at")?,
    }))
}

fn required(key: &str, fields: &mut HashMap<String, String>, field: &str) -> Result<String> {
    fields
        .remove(field)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| PlannerError::consistency(format!("{key}: missing field '{field}'")))
}

/// Missing or empty fields decode as `None` so the caller picks the default.
fn optional_enum<T>(key: &str, fields: &mut HashMap<String, String>, field: &str) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    match fields.remove(field) {
        Some(value) if !value.trim().is_empty() => value
            .parse::<T>()
            .map(Some)
            .map_err(|reason| PlannerError::consistency(format!("{key}: {reason}"))),
        _ => Ok(None),
    }
}

fn timestamp(key: &str, fields: &mut HashMap<String, String>, field: &str) -> Result<Timestamp> {
    let text = required(key, fields, field)?;
    text.parse::<Timestamp>().map_err(|e| {
        PlannerError::consistency(format!("{key}: field '{field}' is not RFC3339 ({e})"))
    })
}
