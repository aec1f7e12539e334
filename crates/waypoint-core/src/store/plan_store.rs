//! Plan CRUD operations and membership indexing.

use std::collections::HashSet;
use std::sync::Arc;

use jiff::Timestamp;
use log::{debug, warn};
use uuid::Uuid;

use super::{codec, keys};
use crate::{
    error::{PlannerError, Result, StorageResultExt},
    kv::{KeyValue, KvError},
    models::{Plan, PlanStatus},
};

/// CRUD and membership indexing for plans.
///
/// Every live plan id is a member of [`keys::PLANS`] and of its
/// application's set. The store never touches task records except to cascade
/// a plan delete.
#[derive(Clone)]
pub struct PlanStore {
    kv: Arc<dyn KeyValue>,
}

impl PlanStore {
    pub fn new(kv: Arc<dyn KeyValue>) -> Self {
        Self { kv }
    }

    /// Creates a new plan with status `new`.
    ///
    /// The record is written first, then the id joins the global and
    /// per-application sets. If a set insert fails the record (and any set
    /// entry already added) is removed again before the error is returned.
    pub fn create(&self, application_id: &str, name: &str, description: &str) -> Result<Plan> {
        if application_id.trim().is_empty() {
            return Err(PlannerError::invalid_input("application_id").with_reason("must not be empty"));
        }
        if name.trim().is_empty() {
            return Err(PlannerError::invalid_input("name").with_reason("must not be empty"));
        }

        let now = Timestamp::now();
        let plan = Plan {
            id: Uuid::new_v4().to_string(),
            application_id: application_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            notes: String::new(),
            status: PlanStatus::New,
            created_at: now,
            updated_at: now,
        };

        let plan_key = keys::plan(&plan.id);
        self.kv
            .hset(&plan_key, &codec::plan_fields(&plan))
            .kv_context("Failed to write plan record")?;

        if let Err(e) = self.kv.sadd(keys::PLANS, &plan.id) {
            self.compensate_create(&plan, false);
            return Err(PlannerError::storage("Failed to index plan").with_source(e));
        }

        if let Err(e) = self.kv.sadd(&keys::app_plans(application_id), &plan.id) {
            self.compensate_create(&plan, true);
            return Err(PlannerError::storage("Failed to index plan by application").with_source(e));
        }

        debug!("Created plan {} for application {}", plan.id, plan.application_id);
        Ok(plan)
    }

    fn compensate_create(&self, plan: &Plan, indexed_globally: bool) {
        warn!("Rolling back plan {} after failed index insert", plan.id);
        if indexed_globally {
            if let Err(e) = self.kv.srem(keys::PLANS, &plan.id) {
                warn!("Could not remove plan {} from the plan set: {e}", plan.id);
            }
        }
        if let Err(e) = self.kv.del(&keys::plan(&plan.id)) {
            warn!("Could not remove plan record {}: {e}", plan.id);
        }
    }

    /// Retrieves a plan by its ID.
    pub fn get(&self, id: &str) -> Result<Plan> {
        self.find(id)?
            .ok_or_else(|| PlannerError::PlanNotFound { id: id.to_string() })
    }

    fn find(&self, id: &str) -> Result<Option<Plan>> {
        let key = keys::plan(id);
        let fields = self
            .kv
            .hgetall(&key)
            .kv_context_lazy(|| format!("Failed to read plan {id}"))?;
        codec::decode_plan(&key, fields)
    }

    /// Fails with `PlanNotFound` when the record was deleted after it was read.
    fn ensure_present(&self, id: &str) -> Result<()> {
        if self.exists(id)? {
            Ok(())
        } else {
            Err(PlannerError::PlanNotFound { id: id.to_string() })
        }
    }

    /// Whether a plan record exists.
    pub fn exists(&self, id: &str) -> Result<bool> {
        self.kv
            .exists(&keys::plan(id))
            .kv_context_lazy(|| format!("Failed to check plan {id}"))
    }

    /// Ids of every live plan.
    pub fn live_ids(&self) -> Result<HashSet<String>> {
        Ok(self
            .kv
            .smembers(keys::PLANS)
            .kv_context("Failed to read plan set")?
            .into_iter()
            .collect())
    }

    /// Overwrites the full record and bumps `updated_at`.
    ///
    /// `id` and `created_at` are taken from the stored record. Any status is
    /// accepted. When the application changes, the plan moves between the
    /// per-application sets.
    pub fn update(&self, plan: &Plan) -> Result<Plan> {
        let current = self.get(&plan.id)?;

        let updated = Plan {
            id: current.id.clone(),
            created_at: current.created_at,
            updated_at: Timestamp::now(),
            ..plan.clone()
        };
        if updated.application_id.trim().is_empty() {
            return Err(PlannerError::invalid_input("application_id").with_reason("must not be empty"));
        }

        self.ensure_present(&updated.id)?;
        self.kv
            .hset(&keys::plan(&updated.id), &codec::plan_fields(&updated))
            .kv_context_lazy(|| format!("Failed to write plan {}", updated.id))?;

        if updated.application_id != current.application_id {
            self.kv
                .sadd(&keys::app_plans(&updated.application_id), &updated.id)
                .kv_context("Failed to index plan under its new application")?;
            self.kv
                .srem(&keys::app_plans(&current.application_id), &updated.id)
                .kv_context("Failed to remove plan from its previous application")?;
        }

        debug!("Updated plan {}", updated.id);
        Ok(updated)
    }

    /// Sets only the status and bumps `updated_at`.
    pub fn update_status(&self, id: &str, status: PlanStatus) -> Result<Plan> {
        let mut plan = self.get(id)?;
        plan.status = status;
        plan.updated_at = Timestamp::now();

        self.ensure_present(id)?;
        self.kv
            .hset(&keys::plan(id), &codec::plan_fields(&plan))
            .kv_context_lazy(|| format!("Failed to update status of plan {id}"))?;

        debug!("Plan {id} status set to {}", status.as_str());
        Ok(plan)
    }

    /// Deletes a plan together with every task in its order-index.
    ///
    /// There is no rollback: once task deletion has started, a failing step
    /// leaves the plan partially deleted and is reported as a
    /// [`PlannerError::PartialFailure`] naming that step.
    pub fn delete(&self, id: &str) -> Result<()> {
        let plan = self.get(id)?;
        let index_key = keys::plan_tasks(id);

        let task_ids: Vec<String> = self
            .kv
            .zrange_withscores(&index_key)
            .kv_context_lazy(|| format!("Failed to read task index of plan {id}"))?
            .into_iter()
            .map(|(task_id, _)| task_id)
            .collect();

        for (completed, task_id) in task_ids.iter().enumerate() {
            self.kv.del(&keys::task(task_id)).map_err(|e| {
                PlannerError::partial(
                    "plan delete",
                    completed,
                    format!("task {task_id}"),
                    PlannerError::storage("Failed to delete task record").with_source(e),
                )
            })?;
        }

        let removed = task_ids.len();
        self.kv
            .del(&index_key)
            .map_err(|e| delete_step_failed("task index", removed, e))?;
        self.kv
            .del(&keys::plan(id))
            .map_err(|e| delete_step_failed("plan record", removed, e))?;
        self.kv
            .srem(keys::PLANS, id)
            .map_err(|e| delete_step_failed("plan set", removed, e))?;
        self.kv
            .srem(&keys::app_plans(&plan.application_id), id)
            .map_err(|e| delete_step_failed("application set", removed, e))?;

        debug!("Deleted plan {id} and {} task(s)", task_ids.len());
        Ok(())
    }

    /// Lists all live plans, oldest first.
    pub fn list(&self) -> Result<Vec<Plan>> {
        let ids = self.kv.smembers(keys::PLANS).kv_context("Failed to read plan set")?;
        self.load_members(keys::PLANS, ids)
    }

    /// Lists the plans of one application, oldest first.
    pub fn list_by_application(&self, application_id: &str) -> Result<Vec<Plan>> {
        let set_key = keys::app_plans(application_id);
        let ids = self
            .kv
            .smembers(&set_key)
            .kv_context_lazy(|| format!("Failed to read plans of application {application_id}"))?;
        self.load_members(&set_key, ids)
    }

    /// Lists plans with the given status. Plans stored without a status
    /// count as `new`.
    pub fn list_by_status(&self, status: PlanStatus) -> Result<Vec<Plan>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|plan| plan.status == status)
            .collect())
    }

    fn load_members(&self, set_key: &str, ids: Vec<String>) -> Result<Vec<Plan>> {
        let mut plans = Vec::with_capacity(ids.len());
        for id in ids {
            let plan = self.find(&id)?.ok_or_else(|| {
                PlannerError::consistency(format!("{set_key} lists plan {id} but it has no record"))
            })?;
            plans.push(plan);
        }
        plans.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(plans)
    }
}

fn delete_step_failed(step: &str, tasks_removed: usize, source: KvError) -> PlannerError {
    PlannerError::partial(
        "plan delete",
        tasks_removed,
        step,
        PlannerError::storage(format!("Failed to delete {step}")).with_source(source),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;

    fn create_test_store() -> (Arc<MemoryStore>, PlanStore) {
        let kv = Arc::new(MemoryStore::new());
        let store = PlanStore::new(kv.clone());
        (kv, store)
    }

    #[test]
    fn test_create_indexes_plan() {
        let (kv, store) = create_test_store();

        let plan = store
            .create("app-1", "Roadmap", "Quarterly roadmap")
            .expect("Failed to create plan");

        assert_eq!(plan.status, PlanStatus::New);
        assert_eq!(plan.created_at, plan.updated_at);
        assert!(kv.sismember(keys::PLANS, &plan.id).expect("sismember"));
        assert!(kv
            .sismember(&keys::app_plans("app-1"), &plan.id)
            .expect("sismember"));
        assert_eq!(store.get(&plan.id).expect("get"), plan);
    }

    #[test]
    fn test_create_requires_name() {
        let (kv, store) = create_test_store();

        let err = store.create("app-1", "  ", "").unwrap_err();
        assert!(matches!(err, PlannerError::InvalidInput { ref field, .. } if field == "name"));
        assert!(kv.smembers(keys::PLANS).expect("smembers").is_empty());
    }

    #[test]
    fn test_get_missing_plan() {
        let (_kv, store) = create_test_store();
        let err = store.get("nope").unwrap_err();
        assert!(matches!(err, PlannerError::PlanNotFound { .. }));
    }

    #[test]
    fn test_update_keeps_identity_and_moves_application() {
        let (kv, store) = create_test_store();
        let plan = store.create("app-1", "Roadmap", "").expect("create");

        let mut edited = plan.clone();
        edited.name = "Renamed".into();
        edited.application_id = "app-2".into();
        edited.status = PlanStatus::Cancelled;
        edited.created_at = Timestamp::UNIX_EPOCH;

        let updated = store.update(&edited).expect("update");
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.status, PlanStatus::Cancelled);
        assert_eq!(updated.created_at, plan.created_at);
        assert!(updated.updated_at >= plan.updated_at);

        assert!(!kv.sismember(&keys::app_plans("app-1"), &plan.id).expect("sismember"));
        assert!(kv.sismember(&keys::app_plans("app-2"), &plan.id).expect("sismember"));
    }

    #[test]
    fn test_update_missing_plan_writes_nothing() {
        let (kv, store) = create_test_store();
        let plan = store.create("app-1", "Roadmap", "").expect("create");
        store.delete(&plan.id).expect("delete");

        let err = store.update(&plan).unwrap_err();
        assert!(matches!(err, PlannerError::PlanNotFound { .. }));
        assert!(!kv.exists(&keys::plan(&plan.id)).expect("exists"));
    }

    #[test]
    fn test_status_update_accepts_any_transition() {
        let (_kv, store) = create_test_store();
        let plan = store.create("app-1", "Roadmap", "").expect("create");

        store
            .update_status(&plan.id, PlanStatus::Completed)
            .expect("new -> completed");
        let reopened = store
            .update_status(&plan.id, PlanStatus::New)
            .expect("completed -> new");
        assert_eq!(reopened.status, PlanStatus::New);
        assert_eq!(store.get(&plan.id).expect("get").status, PlanStatus::New);
    }

    #[test]
    fn test_list_filters() {
        let (_kv, store) = create_test_store();
        let a = store.create("app-1", "A", "").expect("create");
        let b = store.create("app-1", "B", "").expect("create");
        let c = store.create("app-2", "C", "").expect("create");
        store
            .update_status(&b.id, PlanStatus::InProgress)
            .expect("status");

        assert_eq!(store.list().expect("list").len(), 3);

        let app1: Vec<String> = store
            .list_by_application("app-1")
            .expect("list")
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(app1.len(), 2);
        assert!(app1.contains(&a.id) && app1.contains(&b.id));

        let new_plans: Vec<String> = store
            .list_by_status(PlanStatus::New)
            .expect("list")
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(new_plans.len(), 2);
        assert!(new_plans.contains(&a.id) && new_plans.contains(&c.id));
    }

    #[test]
    fn test_list_by_status_treats_missing_status_as_new() {
        let (kv, store) = create_test_store();
        kv.hset(
            &keys::plan("legacy"),
            &[
                ("id", "legacy".to_string()),
                ("application_id", "app-1".to_string()),
                ("name", "Legacy".to_string()),
                ("created_at", "2020-01-01T00:00:00Z".to_string()),
                ("updated_at", "2020-01-01T00:00:00Z".to_string()),
            ],
        )
        .expect("hset");
        kv.sadd(keys::PLANS, "legacy").expect("sadd");

        let plans = store.list_by_status(PlanStatus::New).expect("list");
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].id, "legacy");
    }

    #[test]
    fn test_list_reports_dangling_member() {
        let (kv, store) = create_test_store();
        kv.sadd(keys::PLANS, "ghost").expect("sadd");

        let err = store.list().unwrap_err();
        assert!(matches!(err, PlannerError::Consistency { .. }));
    }

    #[test]
    fn test_delete_missing_plan() {
        let (_kv, store) = create_test_store();
        let err = store.delete("nope").unwrap_err();
        assert!(matches!(err, PlannerError::PlanNotFound { .. }));
    }
}
