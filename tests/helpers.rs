//! Test utility functions for molet
#![allow(dead_code)]

use async_trait::async_trait;
use molet::core::{Pipeline, RunStatus, SimulationConfig, StageKind, StageState, Toolchain};
use molet::execution::{ExecutionEngine, ExecutionEvent, FailurePolicy, PipelineError};
use molet::launcher::{LaunchError, ProcessInvocation, ProcessLauncher, ProcessOutput};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const HOME: &str = "/opt/molet";

pub fn toolchain() -> Toolchain {
    Toolchain::new(HOME)
}

/// Identify which stage an invocation belongs to
pub fn stage_of(invocation: &ProcessInvocation) -> Option<StageKind> {
    let toolchain = toolchain();
    StageKind::SEQUENCE.into_iter().find(|kind| {
        let program = toolchain.program_for(*kind);
        program.program == invocation.program
            && invocation.args.starts_with(&program.leading_args)
    })
}

/// Mock launcher that answers per stage and records every launch
#[derive(Clone, Default)]
pub struct MockLauncher {
    responses: Arc<HashMap<StageKind, Result<ProcessOutput, String>>>,
    launched: Arc<Mutex<Vec<ProcessInvocation>>>,
}

impl MockLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    fn respond(mut self, kind: StageKind, response: Result<ProcessOutput, String>) -> Self {
        Arc::make_mut(&mut self.responses).insert(kind, response);
        self
    }

    /// Stage writes `text` on its diagnostic channel and exits with `exit_code`
    pub fn with_diagnostics(self, kind: StageKind, text: &str, exit_code: i32) -> Self {
        self.respond(
            kind,
            Ok(ProcessOutput::new(String::new(), text.to_string(), Some(exit_code))),
        )
    }

    /// Stage exits with `exit_code` and a silent diagnostic channel
    pub fn with_exit_code(self, kind: StageKind, exit_code: i32) -> Self {
        self.respond(
            kind,
            Ok(ProcessOutput::new("working...\n".to_string(), String::new(), Some(exit_code))),
        )
    }

    /// Stage program cannot be started
    pub fn with_launch_failure(self, kind: StageKind, message: &str) -> Self {
        self.respond(kind, Err(message.to_string()))
    }

    pub fn invocations(&self) -> Vec<ProcessInvocation> {
        self.launched.lock().unwrap().clone()
    }

    pub fn launched_stages(&self) -> Vec<StageKind> {
        self.invocations()
            .iter()
            .map(|inv| stage_of(inv).expect("invocation of an unknown program"))
            .collect()
    }
}

#[async_trait]
impl ProcessLauncher for MockLauncher {
    async fn launch(&self, invocation: &ProcessInvocation) -> Result<ProcessOutput, LaunchError> {
        self.launched.lock().unwrap().push(invocation.clone());

        let kind = stage_of(invocation).ok_or_else(|| {
            LaunchError::Internal(format!("MockLauncher: unknown program {:?}", invocation.program))
        })?;

        match self.responses.get(&kind) {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(message)) => Err(LaunchError::Spawn {
                program: invocation.program.to_string_lossy().into_owned(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, message.clone()),
            }),
            None => Ok(ProcessOutput::clean()),
        }
    }
}

/// Configuration document with the given point-source type and some comments
pub fn config_with_point_source(point_source_type: &str) -> String {
    format!(
        r#"/*
 * Lens observation
 */
{{
  "cosmology": {{ "H0": 67.7 }}, // Planck-like
  "point_source": {{ "type": "{}" }},
  "instrument": {{ "bands": [ {{ "name": "F160W", "resolution": 0.13 }} ] }}
}}
"#,
        point_source_type
    )
}

/// Write a configuration document into a fresh directory
pub fn write_config(text: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let path = dir.path().join("lens.json");
    std::fs::write(&path, text).expect("Should write config");
    (dir, path)
}

/// Result from running a pipeline against a mock launcher
pub struct RunResult {
    pub dir: TempDir,
    pub pipeline: Pipeline,
    pub result: Result<(), PipelineError>,
    pub events: Vec<ExecutionEvent>,
    pub launcher: MockLauncher,
}

impl RunResult {
    pub fn working_dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Load, plan and execute a configuration with a mock launcher
pub async fn run_with_mock(config_text: &str, launcher: MockLauncher, policy: FailurePolicy) -> RunResult {
    let (dir, path) = write_config(config_text);
    let config = SimulationConfig::from_file(&path).expect("Should load config");
    let mut pipeline = Pipeline::plan(config, &toolchain()).expect("Should plan stages");

    let events = Arc::new(Mutex::new(Vec::new()));
    let engine = ExecutionEngine::new(launcher.clone(), policy);
    let sink = events.clone();
    engine.add_event_handler(move |event| sink.lock().unwrap().push(event.clone()));

    let result = engine.execute(&mut pipeline).await;
    let events = events.lock().unwrap().clone();

    RunResult {
        dir,
        pipeline,
        result,
        events,
        launcher,
    }
}

/// Assert the stages were launched in exactly this order
pub fn assert_launch_order(result: &RunResult, expected: &[StageKind]) {
    assert_eq!(
        result.launcher.launched_stages(),
        expected.to_vec(),
        "Unexpected launch order"
    );
}

pub fn assert_run_completed(result: &RunResult) {
    assert!(result.result.is_ok(), "Run failed: {:?}", result.result);
    assert_eq!(result.pipeline.state.status, RunStatus::Completed);
}

pub fn assert_run_failed(result: &RunResult) {
    assert!(result.result.is_err(), "Run should have failed");
    assert_eq!(result.pipeline.state.status, RunStatus::Failed);
}

pub fn assert_stage_pending(result: &RunResult, kind: StageKind) {
    let stage = result.pipeline.stage(kind).expect("Stage should exist");
    assert!(
        matches!(stage.state, StageState::Pending),
        "Stage {} should not have run, got {:?}",
        kind,
        stage.state
    );
}

pub fn assert_stage_skipped(result: &RunResult, kind: StageKind) {
    let stage = result.pipeline.stage(kind).expect("Stage should exist");
    assert!(
        matches!(stage.state, StageState::Skipped { .. }),
        "Stage {} should be skipped, got {:?}",
        kind,
        stage.state
    );
}
