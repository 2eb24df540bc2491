//! Run execution

pub mod engine;
pub mod executor;

pub use engine::{EventHandler, ExecutionEngine, ExecutionEvent, PipelineError};
pub use executor::{FailurePolicy, StageError, StageOutcome, StageRunner};
