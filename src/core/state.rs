//! Run and stage state models

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Nothing loaded yet
    Initialized,
    /// Configuration loaded and stages planned
    ConfigLoaded,
    /// Stages are being executed
    Running,
    /// Every applicable stage finished
    Completed,
    /// A stage failed and the run stopped
    Failed,
}

/// State of a single stage
#[derive(Debug, Clone)]
pub enum StageState {
    /// Stage has not been reached yet
    Pending,
    /// Stage process is running
    Running {
        started_at: DateTime<Utc>,
    },
    /// Stage finished; advisory diagnostics are kept when the policy allowed them
    Completed {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        diagnostics: Option<String>,
    },
    /// Stage failed and stopped the run
    Failed {
        error: String,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
    /// Stage not applicable to this configuration
    Skipped {
        reason: String,
    },
}

/// Overall run state
#[derive(Debug, Clone)]
pub struct RunState {
    /// Unique run ID
    pub run_id: Uuid,

    pub status: RunStatus,

    pub started_at: Option<DateTime<Utc>>,

    pub finished_at: Option<DateTime<Utc>>,

    pub total_stages: usize,

    pub completed_stages: usize,

    pub skipped_stages: usize,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            status: RunStatus::Initialized,
            started_at: None,
            finished_at: None,
            total_stages: 0,
            completed_stages: 0,
            skipped_stages: 0,
        }
    }

    /// Mark the configuration as loaded and the plan as built
    pub fn loaded(&mut self, total_stages: usize) {
        self.status = RunStatus::ConfigLoaded;
        self.total_stages = total_stages;
    }

    pub fn start(&mut self) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn complete(&mut self) {
        self.status = RunStatus::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn fail(&mut self) {
        self.status = RunStatus::Failed;
        self.finished_at = Some(Utc::now());
    }
}
