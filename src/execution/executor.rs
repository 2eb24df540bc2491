//! Stage runner - launches one stage and judges its outcome

use crate::{
    core::Stage,
    launcher::{LaunchError, ProcessInvocation, ProcessLauncher, ProcessOutput},
};
use thiserror::Error;
use tracing::{debug, info};

/// Rule that decides whether a finished stage failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Any output on the diagnostic channel fails the stage, whatever the exit code
    #[default]
    Strict,
    /// A non-zero exit fails the stage; diagnostics alone are only warnings
    ExitStatus,
}

/// Why a stage failed
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Launch(#[from] LaunchError),

    /// Stage wrote to its diagnostic channel
    #[error("{diagnostics}")]
    Diagnostics {
        diagnostics: String,
        exit_code: Option<i32>,
    },

    /// Stage exited unsuccessfully
    #[error("exited with {}{}", exit_label(.exit_code), diagnostic_suffix(.diagnostics))]
    ExitStatus {
        exit_code: Option<i32>,
        diagnostics: String,
    },
}

fn exit_label(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

fn diagnostic_suffix(diagnostics: &str) -> String {
    if diagnostics.is_empty() {
        String::new()
    } else {
        format!(":\n{}", diagnostics)
    }
}

/// Result of running a stage
#[derive(Debug)]
pub enum StageOutcome {
    /// Stage succeeded; diagnostics the policy tolerated are passed along
    Succeeded { diagnostics: Option<String> },
    /// Stage failed; the run must stop
    Failed { error: StageError },
}

impl FailurePolicy {
    /// Judge a finished process
    pub fn judge(&self, output: ProcessOutput) -> StageOutcome {
        match self {
            FailurePolicy::Strict => {
                if output.stderr.is_empty() {
                    StageOutcome::Succeeded { diagnostics: None }
                } else {
                    StageOutcome::Failed {
                        error: StageError::Diagnostics {
                            diagnostics: output.stderr,
                            exit_code: output.exit_code,
                        },
                    }
                }
            }
            FailurePolicy::ExitStatus => {
                if output.exited_successfully() {
                    let diagnostics = (!output.stderr.is_empty()).then_some(output.stderr);
                    StageOutcome::Succeeded { diagnostics }
                } else {
                    StageOutcome::Failed {
                        error: StageError::ExitStatus {
                            exit_code: output.exit_code,
                            diagnostics: output.stderr,
                        },
                    }
                }
            }
        }
    }
}

/// Runs single stages through a launcher
pub struct StageRunner<L> {
    launcher: L,
    policy: FailurePolicy,
}

impl<L: ProcessLauncher> StageRunner<L> {
    pub fn new(launcher: L, policy: FailurePolicy) -> Self {
        Self { launcher, policy }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Launch a stage, wait for it and judge the result
    pub async fn run(&self, stage: &Stage) -> StageOutcome {
        info!("Executing stage: {}", stage.id());
        debug!("Command for stage {}: {}", stage.id(), stage.command_line());

        let output = match self.launcher.launch(&ProcessInvocation::for_stage(stage)).await {
            Ok(output) => output,
            Err(e) => {
                debug!("Could not launch stage {}: {}", stage.id(), e);
                return StageOutcome::Failed { error: e.into() };
            }
        };

        if !output.stdout.is_empty() {
            debug!("Output from stage {}:\n{}", stage.id(), output.stdout);
        }

        let outcome = self.policy.judge(output);
        match &outcome {
            StageOutcome::Succeeded { diagnostics: Some(text) } => {
                debug!("Stage {} succeeded with diagnostics: {}", stage.id(), text.trim_end());
            }
            StageOutcome::Failed { error } => {
                debug!("Stage {} failed: {}", stage.id(), error);
            }
            _ => {}
        }
        outcome
    }
}
