//! Task scheduler
//!
//! Runs housekeeping jobs on cron schedules. Expressions use the six-field
//! `sec min hour day month weekday` format of the `cron` crate.

use chrono::Utc;
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use mobileorder_core::{Error, Result};

type Handler = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// Scheduled task
#[derive(Clone)]
pub struct Task {
    pub id: String,
    pub schedule: Schedule,
    pub handler: Handler,
}

/// Task scheduler
pub struct Scheduler {
    tasks: Arc<RwLock<Vec<Task>>>,
    handles: RwLock<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(RwLock::new(Vec::new())),
            handles: RwLock::new(Vec::new()),
        }
    }

    /// Add a task to the scheduler
    ///
    /// Tasks added after [`Scheduler::start`] are not picked up until the
    /// scheduler is started again.
    pub async fn add_task<F>(&self, id: impl Into<String>, cron_expr: &str, handler: F) -> Result<()>
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        let schedule = Schedule::from_str(cron_expr)
            .map_err(|e| Error::SchedulerError(format!("Invalid cron expression: {}", e)))?;

        let task = Task {
            id: id.into(),
            schedule,
            handler: Arc::new(handler),
        };

        info!(id = %task.id, schedule = %cron_expr, "Scheduled task added");
        self.tasks.write().await.push(task);

        Ok(())
    }

    /// Number of registered tasks
    pub async fn task_count(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Start the scheduler, one timer loop per task
    pub async fn start(&self) -> Result<()> {
        info!("Starting scheduler");

        let tasks = self.tasks.read().await.clone();
        let mut handles = self.handles.write().await;

        for task in tasks {
            handles.push(tokio::spawn(run_task(task)));
        }

        Ok(())
    }

    /// Stop all running task loops
    pub async fn shutdown(&self) {
        let mut handles = self.handles.write().await;
        for handle in handles.drain(..) {
            handle.abort();
        }
        info!("Scheduler stopped");
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_task(task: Task) {
    loop {
        let Some(next) = task.schedule.upcoming(Utc).next() else {
            warn!(task_id = %task.id, "Schedule has no upcoming run, stopping task");
            return;
        };

        let wait = (next - Utc::now()).to_std().unwrap_or_default();
        debug!(task_id = %task.id, next = %next, "Waiting for next run");
        tokio::time::sleep(wait).await;

        match (task.handler)() {
            Ok(()) => {
                info!(task_id = %task.id, "Task completed successfully");
            }
            Err(e) => {
                error!(task_id = %task.id, error = %e, "Task execution failed");
            }
        }
    }
}
