//! Main execution engine - drives the stage sequence of a run

use crate::{
    core::{ConfigError, Pipeline, RunStatus, StageKind, StageState},
    execution::{FailurePolicy, StageError, StageOutcome, StageRunner},
    launcher::ProcessLauncher,
};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Events that can occur during a run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        working_dir: PathBuf,
    },
    StageStarted {
        stage: StageKind,
        label: &'static str,
    },
    StageSkipped {
        stage: StageKind,
        reason: String,
    },
    /// Stage succeeded but wrote diagnostics the policy tolerated
    StageWarning {
        stage: StageKind,
        diagnostics: String,
    },
    StageCompleted {
        stage: StageKind,
        /// Set when the stage exited cleanly but its artifact is not on disk
        missing_artifact: Option<PathBuf>,
    },
    StageFailed {
        stage: StageKind,
        error: String,
    },
    RunFinished {
        run_id: Uuid,
        status: RunStatus,
        working_dir: PathBuf,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&ExecutionEvent) + Send + Sync>;

/// Errors that stop a run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: StageKind,
        #[source]
        source: StageError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("run {0} was already executed")]
    AlreadyExecuted(Uuid),
}

/// Main pipeline execution engine
pub struct ExecutionEngine<L> {
    runner: StageRunner<L>,
    event_handlers: Mutex<Vec<EventHandler>>,
}

impl<L: ProcessLauncher> ExecutionEngine<L> {
    pub fn new(launcher: L, policy: FailurePolicy) -> Self {
        Self {
            runner: StageRunner::new(launcher, policy),
            event_handlers: Mutex::new(Vec::new()),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(&ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    fn emit_event(&self, event: ExecutionEvent) {
        let handlers = self
            .event_handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for handler in handlers.iter() {
            handler(&event);
        }
    }

    /// Execute every applicable stage in order, stopping at the first failure
    pub async fn execute(&self, pipeline: &mut Pipeline) -> Result<(), PipelineError> {
        let run_id = pipeline.state.run_id;
        if pipeline.state.status != RunStatus::ConfigLoaded {
            return Err(PipelineError::AlreadyExecuted(run_id));
        }

        let working_dir = pipeline.working_dir().to_path_buf();
        info!(
            "Starting run {} in {} ({:?} policy)",
            run_id,
            working_dir.display(),
            self.runner.policy()
        );

        pipeline.state.start();
        self.emit_event(ExecutionEvent::RunStarted {
            run_id,
            working_dir: working_dir.clone(),
        });

        for index in 0..pipeline.stages.len() {
            if let Err(e) = self.execute_stage(pipeline, index).await {
                pipeline.state.fail();
                self.emit_event(ExecutionEvent::RunFinished {
                    run_id,
                    status: RunStatus::Failed,
                    working_dir,
                });
                return Err(e);
            }
        }

        pipeline.state.complete();
        info!(
            "Run {} finished: {} completed, {} skipped",
            run_id, pipeline.state.completed_stages, pipeline.state.skipped_stages
        );
        self.emit_event(ExecutionEvent::RunFinished {
            run_id,
            status: RunStatus::Completed,
            working_dir,
        });

        Ok(())
    }

    /// Execute a single stage
    async fn execute_stage(&self, pipeline: &mut Pipeline, index: usize) -> Result<(), PipelineError> {
        let kind = pipeline.stages[index].kind;

        if !pipeline.is_applicable(&pipeline.stages[index])? {
            let reason = pipeline.stages[index].applicability.skip_reason();
            info!("Skipping stage {}: {}", kind, reason);
            pipeline.stages[index].state = StageState::Skipped {
                reason: reason.clone(),
            };
            pipeline.state.skipped_stages += 1;
            self.emit_event(ExecutionEvent::StageSkipped {
                stage: kind,
                reason,
            });
            return Ok(());
        }

        let started_at = Utc::now();
        pipeline.stages[index].state = StageState::Running { started_at };
        self.emit_event(ExecutionEvent::StageStarted {
            stage: kind,
            label: kind.label(),
        });

        match self.runner.run(&pipeline.stages[index]).await {
            StageOutcome::Succeeded { diagnostics } => {
                let artifact = &pipeline.stages[index].artifact;
                let missing_artifact = if tokio::fs::try_exists(artifact).await.unwrap_or(false) {
                    None
                } else {
                    debug!("Stage {} did not produce {}", kind, artifact.display());
                    Some(artifact.clone())
                };

                pipeline.stages[index].state = StageState::Completed {
                    started_at,
                    completed_at: Utc::now(),
                    diagnostics,
                };
                pipeline.state.completed_stages += 1;
                self.emit_event(ExecutionEvent::StageCompleted {
                    stage: kind,
                    missing_artifact,
                });

                if let StageState::Completed {
                    diagnostics: Some(text),
                    ..
                } = &pipeline.stages[index].state
                {
                    self.emit_event(ExecutionEvent::StageWarning {
                        stage: kind,
                        diagnostics: text.clone(),
                    });
                }
                Ok(())
            }
            StageOutcome::Failed { error } => {
                error!("Stopping run at stage {}", kind);
                pipeline.stages[index].state = StageState::Failed {
                    error: error.to_string(),
                    started_at,
                    failed_at: Utc::now(),
                };
                self.emit_event(ExecutionEvent::StageFailed {
                    stage: kind,
                    error: error.to_string(),
                });
                Err(PipelineError::Stage {
                    stage: kind,
                    source: error,
                })
            }
        }
    }
}
