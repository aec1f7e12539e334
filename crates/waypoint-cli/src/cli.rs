//! Command definitions and their handlers.
//!
//! Each subcommand has a clap argument struct converted into the matching
//! core params type with `From`, so clap concerns stay out of
//! `waypoint_core`:
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Planner
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use serde_json::json;
use waypoint_core::{
    display::{CreateResult, DeleteResult, OperationStatus, Plans, Tasks, UpdateResult},
    params::*,
    NewTask, PlanStatus, Planner, TaskPriority, TaskStatus,
};

use crate::renderer::TerminalRenderer;

/// Create a new plan
#[derive(Args)]
pub struct CreatePlanArgs {
    /// Application the plan belongs to
    pub application_id: String,
    /// Name of the plan
    pub name: String,
    /// Optional description providing more context about the plan
    #[arg(short, long)]
    pub description: Option<String>,
}

impl From<CreatePlanArgs> for CreatePlan {
    fn from(val: CreatePlanArgs) -> Self {
        CreatePlan {
            application_id: val.application_id,
            name: val.name,
            description: val.description,
        }
    }
}

/// List plans, optionally filtered by application and status
#[derive(Args)]
pub struct ListPlansArgs {
    /// Only plans of this application
    #[arg(long = "app")]
    pub application_id: Option<String>,
    /// Only plans with this status
    #[arg(long, value_enum)]
    pub status: Option<PlanStatusArg>,
}

impl From<ListPlansArgs> for ListPlans {
    fn from(val: ListPlansArgs) -> Self {
        ListPlans {
            application_id: val.application_id,
            status: val.status.map(|s| PlanStatus::from(s).as_str().to_string()),
        }
    }
}

/// Arguments naming a single plan or task
#[derive(Args)]
pub struct IdArgs {
    /// ID of the plan or task
    pub id: String,
}

impl From<IdArgs> for Id {
    fn from(val: IdArgs) -> Self {
        Id { id: val.id }
    }
}

/// Update fields of a plan; omitted fields are left unchanged
#[derive(Args)]
pub struct UpdatePlanArgs {
    /// ID of the plan to update
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Markdown notes replacing the current ones
    #[arg(long)]
    pub notes: Option<String>,
    /// Move the plan to another application
    #[arg(long = "app")]
    pub application_id: Option<String>,
    #[arg(long, value_enum)]
    pub status: Option<PlanStatusArg>,
}

impl From<UpdatePlanArgs> for UpdatePlan {
    fn from(val: UpdatePlanArgs) -> Self {
        UpdatePlan {
            id: val.id,
            application_id: val.application_id,
            name: val.name,
            description: val.description,
            notes: val.notes,
            status: val.status.map(|s| PlanStatus::from(s).as_str().to_string()),
        }
    }
}

/// Set the status of a plan
#[derive(Args)]
pub struct PlanStatusArgs {
    /// ID of the plan
    pub id: String,
    /// New status
    #[arg(value_enum)]
    pub status: PlanStatusArg,
}

impl From<PlanStatusArgs> for UpdatePlanStatus {
    fn from(val: PlanStatusArgs) -> Self {
        UpdatePlanStatus {
            id: val.id,
            status: PlanStatus::from(val.status).as_str().to_string(),
        }
    }
}

/// Plan management subcommands
#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create a new plan
    Create(CreatePlanArgs),
    /// List plans
    List(ListPlansArgs),
    /// Show a plan and its tasks
    Show(IdArgs),
    /// Update fields of a plan
    Update(UpdatePlanArgs),
    /// Set the status of a plan
    Status(PlanStatusArgs),
    /// Delete a plan and all of its tasks
    Delete(IdArgs),
    /// Renumber a plan's tasks to close gaps left by interrupted writes
    Repack(IdArgs),
}

/// Append a task to a plan
#[derive(Args)]
pub struct AddTaskArgs {
    /// ID of the plan to append the task to
    pub plan_id: String,
    /// Title of the task
    pub title: String,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(short, long, value_enum)]
    pub priority: Option<PriorityArg>,
}

impl From<AddTaskArgs> for CreateTask {
    fn from(val: AddTaskArgs) -> Self {
        CreateTask {
            plan_id: val.plan_id,
            title: val.title,
            description: val.description,
            priority: val.priority.map(|p| TaskPriority::from(p).as_str().to_string()),
        }
    }
}

/// Append several tasks from a JSON array
#[derive(Args)]
pub struct BulkTaskArgs {
    /// ID of the plan to append the tasks to
    pub plan_id: String,
    /// JSON file holding an array of tasks, or `-` for stdin
    pub file: PathBuf,
}

/// List tasks of a plan, by status, or both
#[derive(Args)]
pub struct ListTasksArgs {
    /// Only tasks of this plan, in plan order
    #[arg(long = "plan")]
    pub plan_id: Option<String>,
    /// Only tasks with this status
    #[arg(long, value_enum)]
    pub status: Option<TaskStatusArg>,
}

impl From<ListTasksArgs> for ListTasks {
    fn from(val: ListTasksArgs) -> Self {
        ListTasks {
            plan_id: val.plan_id,
            status: val.status.map(|s| TaskStatus::from(s).as_str().to_string()),
        }
    }
}

/// Update fields of a task; omitted fields are left unchanged
#[derive(Args)]
pub struct UpdateTaskArgs {
    /// ID of the task to update
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Markdown notes replacing the current ones
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long, value_enum)]
    pub status: Option<TaskStatusArg>,
    #[arg(short, long, value_enum)]
    pub priority: Option<PriorityArg>,
}

impl From<UpdateTaskArgs> for UpdateTask {
    fn from(val: UpdateTaskArgs) -> Self {
        UpdateTask {
            id: val.id,
            plan_id: None,
            title: val.title,
            description: val.description,
            notes: val.notes,
            status: val.status.map(|s| TaskStatus::from(s).as_str().to_string()),
            priority: val.priority.map(|p| TaskPriority::from(p).as_str().to_string()),
        }
    }
}

/// Move a task to the end of another plan
#[derive(Args)]
pub struct MoveTaskArgs {
    /// ID of the task to move
    pub id: String,
    /// ID of the destination plan
    pub plan_id: String,
}

impl From<MoveTaskArgs> for UpdateTask {
    fn from(val: MoveTaskArgs) -> Self {
        UpdateTask {
            id: val.id,
            plan_id: Some(val.plan_id),
            ..UpdateTask::default()
        }
    }
}

/// Move a task to a new position within its plan
#[derive(Args)]
pub struct ReorderTaskArgs {
    /// ID of the task
    pub id: String,
    /// Zero-based target position
    #[arg(allow_negative_numbers = true)]
    pub order: i64,
}

impl From<ReorderTaskArgs> for ReorderTask {
    fn from(val: ReorderTaskArgs) -> Self {
        ReorderTask {
            id: val.id,
            order: val.order,
        }
    }
}

/// Task management subcommands
#[derive(Subcommand)]
pub enum TaskCommands {
    /// Append a task to a plan
    Add(AddTaskArgs),
    /// Append several tasks from a JSON file
    Bulk(BulkTaskArgs),
    /// Show a task
    Show(IdArgs),
    /// List tasks
    List(ListTasksArgs),
    /// Update fields of a task
    Update(UpdateTaskArgs),
    /// Move a task to the end of another plan
    Move(MoveTaskArgs),
    /// Move a task to a new position within its plan
    Reorder(ReorderTaskArgs),
    /// Delete a task
    Delete(IdArgs),
    /// List tasks whose plan no longer exists
    Orphans,
}

/// Plan status values accepted on the command line
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PlanStatusArg {
    New,
    #[value(alias = "in_progress")]
    Inprogress,
    Completed,
    Cancelled,
}

impl From<PlanStatusArg> for PlanStatus {
    fn from(val: PlanStatusArg) -> Self {
        match val {
            PlanStatusArg::New => PlanStatus::New,
            PlanStatusArg::Inprogress => PlanStatus::InProgress,
            PlanStatusArg::Completed => PlanStatus::Completed,
            PlanStatusArg::Cancelled => PlanStatus::Cancelled,
        }
    }
}

/// Task status values accepted on the command line
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TaskStatusArg {
    Pending,
    #[value(name = "in_progress", alias = "inprogress")]
    InProgress,
    Completed,
    Cancelled,
}

impl From<TaskStatusArg> for TaskStatus {
    fn from(val: TaskStatusArg) -> Self {
        match val {
            TaskStatusArg::Pending => TaskStatus::Pending,
            TaskStatusArg::InProgress => TaskStatus::InProgress,
            TaskStatusArg::Completed => TaskStatus::Completed,
            TaskStatusArg::Cancelled => TaskStatus::Cancelled,
        }
    }
}

/// Task priority values accepted on the command line
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for TaskPriority {
    fn from(val: PriorityArg) -> Self {
        match val {
            PriorityArg::Low => TaskPriority::Low,
            PriorityArg::Medium => TaskPriority::Medium,
            PriorityArg::High => TaskPriority::High,
        }
    }
}

/// Runs commands against a planner and renders the results.
pub struct Cli {
    planner: Planner,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(planner: Planner, renderer: TerminalRenderer) -> Self {
        Self { planner, renderer }
    }

    pub async fn handle_plan_command(&self, command: PlanCommands) -> Result<()> {
        match command {
            PlanCommands::Create(args) => {
                let plan = self
                    .planner
                    .create_plan(&args.into())
                    .await
                    .context("Failed to create plan")?;
                self.renderer
                    .render(&CreateResult::new(plan.clone()).to_string(), &plan)
            }
            PlanCommands::List(args) => self.list_plans(&args.into()).await,
            PlanCommands::Show(args) => {
                let id: Id = args.into();
                let plan = self
                    .planner
                    .get_plan(&id)
                    .await
                    .with_context(|| format!("Failed to load plan {}", id.id))?;
                let tasks = self
                    .planner
                    .list_tasks(&ListTasks {
                        plan_id: Some(id.id.clone()),
                        status: None,
                    })
                    .await
                    .with_context(|| format!("Failed to load tasks of plan {}", id.id))?;

                let json = json!({ "plan": &plan, "tasks": &tasks });
                let markdown = format!("{plan}\n## Tasks\n\n{}", Tasks(tasks));
                self.renderer.render(&markdown, &json)
            }
            PlanCommands::Update(args) => {
                let plan = self
                    .planner
                    .update_plan(&args.into())
                    .await
                    .context("Failed to update plan")?;
                self.renderer
                    .render(&UpdateResult::new(plan.clone()).to_string(), &plan)
            }
            PlanCommands::Status(args) => {
                let params: UpdatePlanStatus = args.into();
                let plan = self
                    .planner
                    .update_plan_status(&params)
                    .await
                    .context("Failed to update plan status")?;
                let changes = vec![format!("Status set to {}", plan.status)];
                self.renderer.render(
                    &UpdateResult::with_changes(plan.clone(), changes).to_string(),
                    &plan,
                )
            }
            PlanCommands::Delete(args) => {
                let plan = self
                    .planner
                    .delete_plan(&args.into())
                    .await
                    .context("Failed to delete plan")?;
                self.renderer
                    .render(&DeleteResult::new(plan.clone()).to_string(), &plan)
            }
            PlanCommands::Repack(args) => {
                let id: Id = args.into();
                let rewritten = self
                    .planner
                    .repack_plan(&id)
                    .await
                    .with_context(|| format!("Failed to repack plan {}", id.id))?;
                let status = OperationStatus::success(format!(
                    "Repacked plan {}: {rewritten} task(s) renumbered",
                    id.id
                ));
                self.renderer.render(
                    &status.to_string(),
                    &json!({ "planId": id.id, "rewritten": rewritten }),
                )
            }
        }
    }

    pub async fn handle_task_command(&self, command: TaskCommands) -> Result<()> {
        match command {
            TaskCommands::Add(args) => {
                let task = self
                    .planner
                    .add_task(&args.into())
                    .await
                    .context("Failed to add task")?;
                self.renderer
                    .render(&CreateResult::new(task.clone()).to_string(), &task)
            }
            TaskCommands::Bulk(args) => {
                let tasks = read_task_inputs(&args.file)?;
                let created = self
                    .planner
                    .add_tasks(&CreateTasks {
                        plan_id: args.plan_id,
                        tasks,
                    })
                    .await
                    .context("Failed to add tasks")?;
                self.renderer
                    .render(&CreateResult::new(created.clone()).to_string(), &created)
            }
            TaskCommands::Show(args) => {
                let id: Id = args.into();
                let task = self
                    .planner
                    .get_task(&id)
                    .await
                    .with_context(|| format!("Failed to load task {}", id.id))?;
                self.renderer.render(&task.to_string(), &task)
            }
            TaskCommands::List(args) => {
                let tasks = self
                    .planner
                    .list_tasks(&args.into())
                    .await
                    .context("Failed to list tasks")?;
                self.renderer.render(&Tasks(tasks.clone()).to_string(), &tasks)
            }
            TaskCommands::Update(args) => {
                let task = self
                    .planner
                    .update_task(&args.into())
                    .await
                    .context("Failed to update task")?;
                self.renderer
                    .render(&UpdateResult::new(task.clone()).to_string(), &task)
            }
            TaskCommands::Move(args) => {
                let task = self
                    .planner
                    .update_task(&args.into())
                    .await
                    .context("Failed to move task")?;
                let changes = vec![format!(
                    "Moved to plan {} at position {}",
                    task.plan_id, task.order
                )];
                self.renderer.render(
                    &UpdateResult::with_changes(task.clone(), changes).to_string(),
                    &task,
                )
            }
            TaskCommands::Reorder(args) => {
                let task = self
                    .planner
                    .reorder_task(&args.into())
                    .await
                    .context("Failed to reorder task")?;
                let changes = vec![format!("Moved to position {}", task.order)];
                self.renderer.render(
                    &UpdateResult::with_changes(task.clone(), changes).to_string(),
                    &task,
                )
            }
            TaskCommands::Delete(args) => {
                let task = self
                    .planner
                    .delete_task(&args.into())
                    .await
                    .context("Failed to delete task")?;
                self.renderer
                    .render(&DeleteResult::new(task.clone()).to_string(), &task)
            }
            TaskCommands::Orphans => {
                let tasks = self
                    .planner
                    .list_orphaned_tasks()
                    .await
                    .context("Failed to list orphaned tasks")?;
                self.renderer.render(&Tasks(tasks.clone()).to_string(), &tasks)
            }
        }
    }

    pub async fn list_plans(&self, params: &ListPlans) -> Result<()> {
        let plans = self
            .planner
            .list_plans(params)
            .await
            .context("Failed to list plans")?;
        self.renderer.render(&Plans(plans.clone()).to_string(), &plans)
    }
}

fn read_task_inputs(path: &Path) -> Result<Vec<NewTask>> {
    let raw = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read tasks from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&raw).context("Task input must be a JSON array of task objects")
}
