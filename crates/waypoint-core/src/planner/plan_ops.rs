//! Plan operations for the Planner.

use super::Planner;
use crate::{
    error::Result,
    models::Plan,
    notes,
    params::{CreatePlan, Id, ListPlans, UpdatePlan, UpdatePlanStatus},
};

impl Planner {
    /// Creates a new plan with status `new`.
    pub async fn create_plan(&self, params: &CreatePlan) -> Result<Plan> {
        let application_id = params.application_id.clone();
        let name = params.name.clone();
        let description = params.description.clone().unwrap_or_default();

        self.run("create plan", move |plans, _| {
            plans.create(&application_id, &name, &description)
        })
        .await
    }

    /// Retrieves a plan by its ID.
    pub async fn get_plan(&self, params: &Id) -> Result<Plan> {
        let id = params.id.clone();
        self.run("get plan", move |plans, _| plans.get(&id)).await
    }

    /// Applies a partial update. Fields left as `None` keep their stored
    /// values; notes are normalised before they are stored.
    pub async fn update_plan(&self, params: &UpdatePlan) -> Result<Plan> {
        let status = params.validate()?;
        let notes = params.notes.as_deref().map(notes::prepare).transpose()?;
        let params = params.clone();

        self.run("update plan", move |plans, _| {
            let mut plan = plans.get(&params.id)?;
            if let Some(application_id) = params.application_id {
                plan.application_id = application_id;
            }
            if let Some(name) = params.name {
                plan.name = name;
            }
            if let Some(description) = params.description {
                plan.description = description;
            }
            if let Some(notes) = notes {
                plan.notes = notes;
            }
            if let Some(status) = status {
                plan.status = status;
            }
            plans.update(&plan)
        })
        .await
    }

    /// Sets only the status of a plan.
    pub async fn update_plan_status(&self, params: &UpdatePlanStatus) -> Result<Plan> {
        let status = params.validate()?;
        let id = params.id.clone();
        self.run("update plan status", move |plans, _| {
            plans.update_status(&id, status)
        })
        .await
    }

    /// Deletes a plan and all of its tasks, returning the deleted plan.
    pub async fn delete_plan(&self, params: &Id) -> Result<Plan> {
        let id = params.id.clone();
        self.run("delete plan", move |plans, _| {
            let plan = plans.get(&id)?;
            plans.delete(&id)?;
            Ok(plan)
        })
        .await
    }

    /// Lists plans, optionally filtered by application and status.
    pub async fn list_plans(&self, params: &ListPlans) -> Result<Vec<Plan>> {
        let status = params.validate()?;
        let application_id = params.application_id.clone();

        self.run("list plans", move |plans, _| {
            let listed = match (&application_id, status) {
                (Some(app), _) => plans.list_by_application(app)?,
                (None, Some(status)) => return plans.list_by_status(status),
                (None, None) => plans.list()?,
            };
            Ok(match status {
                Some(status) => listed.into_iter().filter(|p| p.status == status).collect(),
                None => listed,
            })
        })
        .await
    }
}
