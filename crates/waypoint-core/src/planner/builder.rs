//! Builder for creating and configuring Planner instances.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::task;

use super::Planner;
use crate::{
    error::{PlannerError, Result, StorageResultExt},
    kv::{KeyValue, MemoryStore, SqliteStore},
    store::open_stores,
};

#[derive(Debug, Clone)]
enum Backend {
    Sqlite(Option<PathBuf>),
    Memory,
    #[cfg(feature = "redis")]
    Redis(String),
}

/// Builder for creating and configuring Planner instances.
///
/// Defaults to a SQLite file at the XDG data location with no deadline.
#[derive(Debug, Clone)]
pub struct PlannerBuilder {
    backend: Backend,
    timeout: Option<Duration>,
}

impl PlannerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            backend: Backend::Sqlite(None),
            timeout: None,
        }
    }

    /// Sets a custom SQLite database file path.
    ///
    /// If not specified, uses the XDG Base Directory specification:
    /// `$XDG_DATA_HOME/waypoint/waypoint.db` or
    /// `~/.local/share/waypoint/waypoint.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.backend = Backend::Sqlite(Some(path.as_ref().to_path_buf()));
        }
        self
    }

    /// Keeps everything in process memory. Nothing survives the planner.
    pub fn in_memory(mut self) -> Self {
        self.backend = Backend::Memory;
        self
    }

    /// Connects to a Redis server instead of SQLite.
    #[cfg(feature = "redis")]
    pub fn with_redis_url(mut self, url: impl Into<String>) -> Self {
        self.backend = Backend::Redis(url.into());
        self
    }

    /// Bounds every planner call by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the configured planner instance.
    ///
    /// # Errors
    ///
    /// Returns `PlannerError::XdgDirectory` if the default path cannot be
    /// resolved, `PlannerError::FileSystem` if its directory cannot be
    /// created, and `PlannerError::Storage` if the backend fails to open.
    pub async fn build(self) -> Result<Planner> {
        let kv: Arc<dyn KeyValue> = match self.backend {
            Backend::Memory => Arc::new(MemoryStore::new()),
            Backend::Sqlite(path) => {
                let db_path = match path {
                    Some(path) => path,
                    None => Self::default_database_path()?,
                };
                if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| PlannerError::FileSystem {
                        path: parent.to_path_buf(),
                        source: e,
                    })?;
                }
                debug!("Opening SQLite store at {}", db_path.display());
                let store = task::spawn_blocking(move || {
                    SqliteStore::open(&db_path)
                        .kv_context_lazy(|| format!("Failed to open {}", db_path.display()))
                })
                .await
                .map_err(|e| PlannerError::Configuration {
                    message: format!("Task join error: {e}"),
                })??;
                Arc::new(store)
            }
            #[cfg(feature = "redis")]
            Backend::Redis(url) => {
                debug!("Connecting to Redis");
                let store = task::spawn_blocking(move || {
                    crate::kv::RedisStore::connect(&url).kv_context("Failed to connect to Redis")
                })
                .await
                .map_err(|e| PlannerError::Configuration {
                    message: format!("Task join error: {e}"),
                })??;
                Arc::new(store)
            }
        };

        let (plans, tasks) = open_stores(kv);
        Ok(Planner::new(plans, tasks, self.timeout))
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("waypoint")
            .place_data_file("waypoint.db")
            .map_err(|e| PlannerError::XdgDirectory(e.to_string()))
    }
}

impl Default for PlannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
