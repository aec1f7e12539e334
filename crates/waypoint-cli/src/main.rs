//! Waypoint CLI Application
//!
//! Command-line interface for the waypoint plan and task store.

mod args;
mod cli;
mod renderer;

use std::time::Duration;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use log::info;
use renderer::{OutputMode, TerminalRenderer};
use waypoint_core::{params::ListPlans, PlannerBuilder};
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        redis_url,
        timeout_ms,
        json,
        no_color,
        command,
    } = Args::parse();

    let builder = PlannerBuilder::new()
        .with_database_path(database_file)
        .with_timeout(timeout_ms.map(Duration::from_millis));
    let builder = match redis_url {
        Some(url) => with_redis(builder, url)?,
        None => builder,
    };
    let planner = builder
        .build()
        .await
        .context("Failed to initialize planner")?;

    let mode = if json {
        OutputMode::Json
    } else if no_color {
        OutputMode::Plain
    } else {
        OutputMode::Rich
    };
    let renderer = TerminalRenderer::new(mode);
    info!("Waypoint started with {:?} output", renderer.mode());
    let cli = Cli::new(planner, renderer);

    match command {
        Some(Plan { command }) => cli.handle_plan_command(command).await,
        Some(Task { command }) => cli.handle_task_command(command).await,
        None => cli.list_plans(&ListPlans::default()).await,
    }
}

#[cfg(feature = "redis")]
fn with_redis(builder: PlannerBuilder, url: String) -> Result<PlannerBuilder> {
    Ok(builder.with_redis_url(url))
}

#[cfg(not(feature = "redis"))]
fn with_redis(_builder: PlannerBuilder, _url: String) -> Result<PlannerBuilder> {
    anyhow::bail!("This build of wp has no Redis support; rebuild with --features redis")
}
