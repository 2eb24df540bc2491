//! Launching external stage processes

pub mod error;
pub mod subprocess;

use crate::core::Stage;
use async_trait::async_trait;
use std::ffi::OsString;

pub use error::LaunchError;
pub use subprocess::SubprocessLauncher;

/// Trait for process launching - allows the real subprocess or a test double
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Launch a process, wait for it to exit and capture both output channels
    async fn launch(&self, invocation: &ProcessInvocation) -> Result<ProcessOutput, LaunchError>;
}

/// A fully resolved command: no shell, one token per argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl ProcessInvocation {
    pub fn new<P: Into<OsString>>(program: P, args: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn for_stage(stage: &Stage) -> Self {
        Self {
            program: stage.program.clone(),
            args: stage.args.clone(),
        }
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,

    /// Diagnostic channel
    pub stderr: String,

    /// Exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    pub fn new(stdout: String, stderr: String, exit_code: Option<i32>) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
        }
    }

    /// A clean exit with nothing on either channel
    pub fn clean() -> Self {
        Self::new(String::new(), String::new(), Some(0))
    }

    pub fn exited_successfully(&self) -> bool {
        self.exit_code == Some(0)
    }
}
