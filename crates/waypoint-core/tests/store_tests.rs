mod common;

use std::sync::Arc;

use common::{assert_dense, backends, FlakyStore};
use waypoint_core::{
    kv::{KeyValue, SqliteStore},
    models::{PlanStatus, TaskPriority},
    store::{keys, open_stores},
    ErrorKind, NewTask, PlannerError,
};

fn new_task(title: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        ..NewTask::default()
    }
}

/// Small deterministic generator so the mixed-operation test is repeatable.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ((self.0 >> 33) % bound as u64) as usize
    }
}

#[test]
fn test_orders_stay_dense_under_mixed_operations() {
    for backend in backends() {
        let (plans, tasks) = backend.stores();
        let plan_a = plans.create("app", "A", "").expect("create plan").id;
        let plan_b = plans.create("app", "B", "").expect("create plan").id;
        let plan_ids = [plan_a, plan_b];
        let mut rng = Lcg(7);

        for step in 0..120 {
            let plan_id = &plan_ids[rng.next(2)];
            let current = tasks.list_by_plan(plan_id).expect("list");
            let context = format!("{} step {step}", backend.name);

            match rng.next(5) {
                0 | 1 => {
                    tasks
                        .create(plan_id, &format!("t{step}"), "", TaskPriority::Medium)
                        .expect("create");
                }
                2 if !current.is_empty() => {
                    let victim = &current[rng.next(current.len())];
                    tasks.delete(&victim.id).expect("delete");
                }
                3 if !current.is_empty() => {
                    let task = &current[rng.next(current.len())];
                    let target = rng.next(current.len()) as i64;
                    let moved = tasks.reorder(&task.id, target).expect("reorder");
                    assert_eq!(i64::from(moved.order), target, "{context}");
                }
                4 if !current.is_empty() => {
                    let mut task = current[rng.next(current.len())].clone();
                    task.plan_id = plan_ids
                        .iter()
                        .find(|id| *id != plan_id)
                        .expect("other plan")
                        .clone();
                    tasks.update(&task).expect("move");
                }
                _ => {}
            }

            for id in &plan_ids {
                assert_dense(backend.kv.as_ref(), &tasks, id, &context);
            }
        }
    }
}

#[test]
fn test_reorder_forward_scenario() {
    for backend in backends() {
        let (plans, tasks) = backend.stores();
        let plan_id = plans.create("app", "Plan", "").expect("create plan").id;
        let created = tasks
            .create_bulk(&plan_id, &[new_task("A"), new_task("B"), new_task("C")])
            .expect("bulk");

        tasks.reorder(&created[0].id, 2).expect("reorder");

        let listed: Vec<(String, u32)> = tasks
            .list_by_plan(&plan_id)
            .expect("list")
            .into_iter()
            .map(|t| (t.title, t.order))
            .collect();
        assert_eq!(
            listed,
            [("B".to_string(), 0), ("C".to_string(), 1), ("A".to_string(), 2)],
            "{}",
            backend.name
        );
    }
}

#[test]
fn test_out_of_range_reorder_changes_nothing() {
    for backend in backends() {
        let (plans, tasks) = backend.stores();
        let plan_id = plans.create("app", "Plan", "").expect("create plan").id;
        let created = tasks
            .create_bulk(&plan_id, &[new_task("A"), new_task("B")])
            .expect("bulk");
        let before = tasks.list_by_plan(&plan_id).expect("list");

        for order in [-1, 2] {
            let err = tasks.reorder(&created[1].id, order).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{}", backend.name);
        }
        assert_eq!(tasks.list_by_plan(&plan_id).expect("list"), before);
    }
}

#[test]
fn test_bulk_create_with_missing_title_writes_nothing() {
    for backend in backends() {
        let (plans, tasks) = backend.stores();
        let plan_id = plans.create("app", "Plan", "").expect("create plan").id;

        let err = tasks
            .create_bulk(&plan_id, &[new_task("A"), new_task(""), new_task("C")])
            .unwrap_err();
        assert!(
            matches!(err, PlannerError::InvalidInput { ref field, .. } if field == "tasks[1].title"),
            "{}",
            backend.name
        );
        assert!(backend
            .kv
            .scan_prefix(keys::TASK_PREFIX)
            .expect("scan")
            .is_empty());
    }
}

#[test]
fn test_plan_delete_cascades() {
    for backend in backends() {
        let (plans, tasks) = backend.stores();
        let plan = plans.create("app", "Plan", "").expect("create plan");
        tasks
            .create_bulk(&plan.id, &[new_task("A"), new_task("B")])
            .expect("bulk");

        plans.delete(&plan.id).expect("delete");

        let kv = &backend.kv;
        assert!(kv.scan_prefix("task:").expect("scan").is_empty());
        assert!(kv.scan_prefix("plan_tasks:").expect("scan").is_empty());
        assert!(kv.scan_prefix("plan:").expect("scan").is_empty());
        assert!(kv.smembers(keys::PLANS).expect("smembers").is_empty());
        assert!(kv.smembers(&keys::app_plans("app")).expect("smembers").is_empty());
        assert!(tasks.list_orphaned().expect("orphans").is_empty());
    }
}

#[test]
fn test_orphans_appear_when_plan_record_is_removed_alone() {
    for backend in backends() {
        let (plans, tasks) = backend.stores();
        let doomed = plans.create("app", "Doomed", "").expect("create plan");
        let kept = plans.create("app", "Kept", "").expect("create plan");
        tasks
            .create_bulk(&doomed.id, &[new_task("A"), new_task("B")])
            .expect("bulk");
        tasks
            .create(&kept.id, "K", "", TaskPriority::Low)
            .expect("create");

        backend.kv.del(&keys::plan(&doomed.id)).expect("del");
        backend.kv.srem(keys::PLANS, &doomed.id).expect("srem");

        let orphans = tasks.list_orphaned().expect("orphans");
        let titles: Vec<&str> = orphans.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["A", "B"], "{}", backend.name);
        assert!(orphans.iter().all(|t| t.plan_id == doomed.id));
    }
}

#[test]
fn test_repack_heals_corrupted_orders() {
    for backend in backends() {
        let (plans, tasks) = backend.stores();
        let plan_id = plans.create("app", "Plan", "").expect("create plan").id;
        let created = tasks
            .create_bulk(&plan_id, &[new_task("A"), new_task("B"), new_task("C")])
            .expect("bulk");

        let kv = &backend.kv;
        kv.hset(&keys::task(&created[0].id), &[("order", "7".to_string())])
            .expect("hset");
        kv.zadd(&keys::plan_tasks(&plan_id), &created[2].id, 40.0)
            .expect("zadd");
        kv.zadd(&keys::plan_tasks(&plan_id), "dangling", 41.0)
            .expect("zadd");

        let rewritten = tasks.repack(&plan_id).expect("repack");
        assert_eq!(rewritten, 2, "{}", backend.name);
        assert_dense(backend.kv.as_ref(), &tasks, &plan_id, backend.name);
        assert_eq!(kv.zcard(&keys::plan_tasks(&plan_id)).expect("zcard"), 3);
        assert_eq!(tasks.repack(&plan_id).expect("repack"), 0);
    }
}

#[test]
fn test_legacy_plan_without_status_lists_as_new() {
    for backend in backends() {
        let (plans, _tasks) = backend.stores();
        backend
            .kv
            .hset(
                &keys::plan("legacy"),
                &[
                    ("id", "legacy".to_string()),
                    ("application_id", "app".to_string()),
                    ("name", "Legacy".to_string()),
                    ("description", String::new()),
                    ("created_at", "2021-06-01T12:00:00Z".to_string()),
                    ("updated_at", "2021-06-01T12:00:00Z".to_string()),
                ],
            )
            .expect("hset");
        backend.kv.sadd(keys::PLANS, "legacy").expect("sadd");

        let listed = plans.list_by_status(PlanStatus::New).expect("list");
        assert_eq!(listed.len(), 1, "{}", backend.name);
        assert_eq!(listed[0].status, PlanStatus::New);
    }
}

#[test]
fn test_failed_task_index_insert_leaves_no_record() {
    let kv = Arc::new(FlakyStore::new());
    let (plans, tasks) = open_stores(kv.clone());
    let plan_id = plans.create("app", "Plan", "").expect("create plan").id;

    kv.fail("zadd", "plan_tasks:");
    let err = tasks
        .create(&plan_id, "Doomed", "", TaskPriority::Medium)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);

    kv.heal();
    assert!(kv.scan_prefix(keys::TASK_PREFIX).expect("scan").is_empty());
    assert_eq!(kv.zcard(&keys::plan_tasks(&plan_id)).expect("zcard"), 0);
}

#[test]
fn test_failed_plan_set_insert_leaves_no_record() {
    let kv = Arc::new(FlakyStore::new());
    let (plans, _tasks) = open_stores(kv.clone());

    kv.fail("sadd", "app:");
    let err = plans.create("app", "Doomed", "").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);

    kv.heal();
    assert!(kv.scan_prefix("plan:").expect("scan").is_empty());
    assert!(kv.smembers(keys::PLANS).expect("smembers").is_empty());
}

#[test]
fn test_reorder_does_not_recreate_a_task_deleted_mid_way() {
    let kv = Arc::new(FlakyStore::new());
    let (plans, tasks) = open_stores(kv.clone());
    let plan_id = plans.create("app", "Plan", "").expect("create plan").id;
    let ids: Vec<String> = ["A", "B", "C"]
        .iter()
        .map(|title| {
            tasks
                .create(&plan_id, title, "", TaskPriority::Medium)
                .expect("create task")
                .id
        })
        .collect();

    // B disappears after reorder has read it but before it is shifted.
    kv.vanish_after_read(&keys::task(&ids[1]));
    let moved = tasks.reorder(&ids[0], 2).expect("reorder");

    assert_eq!(moved.order, 1);
    assert!(!kv.exists(&keys::task(&ids[1])).expect("exists"));
    let titles: Vec<String> = tasks
        .list_by_plan(&plan_id)
        .expect("list")
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, ["C", "A"]);
    assert!(tasks.list_orphaned().expect("orphans").is_empty());
    assert_dense(&*kv, &tasks, &plan_id, "after racing delete");
}

#[test]
fn test_updates_do_not_resurrect_deleted_records() {
    let kv = Arc::new(FlakyStore::new());
    let (plans, tasks) = open_stores(kv.clone());
    let plan = plans.create("app", "Plan", "").expect("create plan");
    let task = tasks
        .create(&plan.id, "Doomed", "", TaskPriority::Medium)
        .expect("create task");

    kv.vanish_after_read(&keys::task(&task.id));
    let mut renamed = task.clone();
    renamed.title = "Renamed".to_string();
    let err = tasks.update(&renamed).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!kv.exists(&keys::task(&task.id)).expect("exists"));

    kv.vanish_after_read(&keys::plan(&plan.id));
    let err = plans
        .update_status(&plan.id, PlanStatus::Completed)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!kv.exists(&keys::plan(&plan.id)).expect("exists"));
}

#[test]
fn test_bulk_create_partial_failure_names_the_input() {
    let kv = Arc::new(FlakyStore::new());
    let (plans, tasks) = open_stores(kv.clone());
    let plan_id = plans.create("app", "Plan", "").expect("create plan").id;

    kv.fail_after("zadd", "plan_tasks:", 2);
    let err = tasks
        .create_bulk(
            &plan_id,
            &[new_task("A"), new_task("B"), new_task("C"), new_task("D")],
        )
        .unwrap_err();

    match &err {
        PlannerError::PartialFailure {
            operation,
            completed,
            failed_at,
            ..
        } => {
            assert_eq!(*operation, "bulk create");
            assert_eq!(*completed, 2);
            assert_eq!(failed_at, "input 2");
        }
        other => panic!("Expected PartialFailure, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::Storage);

    kv.heal();
    let titles: Vec<String> = tasks
        .list_by_plan(&plan_id)
        .expect("list")
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, ["A", "B"]);
    assert_eq!(kv.scan_prefix(keys::TASK_PREFIX).expect("scan").len(), 2);
}

#[test]
fn test_plan_delete_reports_the_failed_step() {
    let kv = Arc::new(FlakyStore::new());
    let (plans, tasks) = open_stores(kv.clone());
    let plan_id = plans.create("app", "Plan", "").expect("create plan").id;
    tasks
        .create_bulk(&plan_id, &[new_task("A"), new_task("B")])
        .expect("bulk");

    kv.fail("del", "plan:");
    let err = plans.delete(&plan_id).unwrap_err();
    match &err {
        PlannerError::PartialFailure {
            completed,
            failed_at,
            ..
        } => {
            assert_eq!(*completed, 2);
            assert_eq!(failed_at, "plan record");
        }
        other => panic!("Expected PartialFailure, got {other:?}"),
    }

    kv.heal();
    assert!(kv.scan_prefix(keys::TASK_PREFIX).expect("scan").is_empty());
    assert!(plans.exists(&plan_id).expect("exists"));
}

#[test]
fn test_sqlite_state_survives_reopen() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let path = dir.path().join("waypoint.db");

    let (plan_id, task_ids) = {
        let kv = Arc::new(SqliteStore::open(&path).expect("open"));
        let (plans, tasks) = open_stores(kv);
        let plan_id = plans.create("app", "Plan", "").expect("create plan").id;
        let created = tasks
            .create_bulk(&plan_id, &[new_task("A"), new_task("B"), new_task("C")])
            .expect("bulk");
        tasks.reorder(&created[2].id, 0).expect("reorder");
        (plan_id, created.into_iter().map(|t| t.id).collect::<Vec<_>>())
    };

    let kv = Arc::new(SqliteStore::open(&path).expect("reopen"));
    let (plans, tasks) = open_stores(kv.clone());
    assert_eq!(plans.get(&plan_id).expect("get").name, "Plan");

    let ids: Vec<String> = tasks
        .list_by_plan(&plan_id)
        .expect("list")
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, [task_ids[2].clone(), task_ids[0].clone(), task_ids[1].clone()]);
    assert_dense(&*kv, &tasks, &plan_id, "reopened");
}
