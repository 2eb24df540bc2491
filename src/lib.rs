//! molet - driver for the lens-simulation stage pipeline

pub mod cli;
pub mod core;
pub mod execution;
pub mod launcher;

// Re-export commonly used types
pub use crate::core::{Pipeline, RunStatus, SimulationConfig, Stage, StageKind, StageState, Toolchain};
pub use execution::{ExecutionEngine, ExecutionEvent, FailurePolicy, PipelineError};
pub use launcher::{ProcessInvocation, ProcessLauncher, ProcessOutput, SubprocessLauncher};
