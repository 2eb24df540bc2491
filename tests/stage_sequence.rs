//! Scenario tests: which stages run, in what order, with which arguments

mod helpers;

use helpers::*;
use molet::core::{RunStatus, StageKind, StageState};
use molet::execution::{ExecutionEvent, FailurePolicy};
use std::ffi::OsString;

/// A disabled point source leaves exactly three launches
#[tokio::test]
async fn test_point_source_none_skips_stage() {
    let result = run_with_mock(
        &config_with_point_source("none"),
        MockLauncher::new(),
        FailurePolicy::Strict,
    )
    .await;

    assert_run_completed(&result);
    assert_launch_order(
        &result,
        &[StageKind::Distances, StageKind::ExtendedSource, StageKind::LensLight],
    );
    assert_stage_skipped(&result, StageKind::PointSource);
    assert_eq!(result.pipeline.state.completed_stages, 3);
    assert_eq!(result.pipeline.state.skipped_stages, 1);
}

/// Every other point-source type runs all four stages in order
#[tokio::test]
async fn test_point_source_types_run_all_stages() {
    for point_source_type in ["point", "", "quasar", "NONE", " none"] {
        let result = run_with_mock(
            &config_with_point_source(point_source_type),
            MockLauncher::new(),
            FailurePolicy::Strict,
        )
        .await;

        assert_run_completed(&result);
        assert_launch_order(
            &result,
            &[
                StageKind::Distances,
                StageKind::ExtendedSource,
                StageKind::PointSource,
                StageKind::LensLight,
            ],
        );
    }
}

/// Stage programs receive the config, the distances artifact and the working directory
#[tokio::test]
async fn test_stage_argument_contract() {
    let result = run_with_mock(
        &config_with_point_source("point"),
        MockLauncher::new(),
        FailurePolicy::Strict,
    )
    .await;
    assert_run_completed(&result);

    let config_path = result.working_dir().join("lens.json").into_os_string();
    let distances = result
        .working_dir()
        .join("angular_diameter_distances.json")
        .into_os_string();
    let mut working_dir = result.working_dir().as_os_str().to_os_string();
    working_dir.push(std::path::MAIN_SEPARATOR_STR);

    let invocations = result.launcher.invocations();
    assert_eq!(invocations.len(), 4);

    // distances: python <script> <config> <working dir>
    assert_eq!(invocations[0].program, OsString::from("python"));
    assert_eq!(
        invocations[0].args,
        vec![
            OsString::from("/opt/molet/cosmology/angular_diameter_distances.py"),
            config_path.clone(),
            working_dir.clone(),
        ]
    );

    // binary stages: <program> <config> <distances> <working dir>
    for invocation in &invocations[1..] {
        assert!(invocation.program.to_string_lossy().starts_with(HOME));
        assert_eq!(
            invocation.args,
            vec![config_path.clone(), distances.clone(), working_dir.clone()]
        );
    }
}

/// Events follow the stage sequence and close with the run result
#[tokio::test]
async fn test_event_ordering() {
    let result = run_with_mock(
        &config_with_point_source("none"),
        MockLauncher::new(),
        FailurePolicy::Strict,
    )
    .await;
    assert_run_completed(&result);

    let trace: Vec<String> = result
        .events
        .iter()
        .map(|event| match event {
            ExecutionEvent::RunStarted { .. } => "run-started".to_string(),
            ExecutionEvent::StageStarted { stage, .. } => format!("started:{}", stage),
            ExecutionEvent::StageSkipped { stage, .. } => format!("skipped:{}", stage),
            ExecutionEvent::StageWarning { stage, .. } => format!("warning:{}", stage),
            ExecutionEvent::StageCompleted { stage, .. } => format!("completed:{}", stage),
            ExecutionEvent::StageFailed { stage, .. } => format!("failed:{}", stage),
            ExecutionEvent::RunFinished { status, .. } => format!("run-finished:{:?}", status),
        })
        .collect();

    assert_eq!(
        trace,
        vec![
            "run-started",
            "started:distances",
            "completed:distances",
            "started:extended_source",
            "completed:extended_source",
            "skipped:point_source",
            "started:lens_light",
            "completed:lens_light",
            "run-finished:Completed",
        ]
    );

    match result.events.last() {
        Some(ExecutionEvent::RunFinished { working_dir, .. }) => {
            assert_eq!(working_dir, result.working_dir());
        }
        other => panic!("Expected RunFinished, got {:?}", other),
    }
}

/// Completed stages keep their timestamps
#[tokio::test]
async fn test_stage_states_after_run() {
    let result = run_with_mock(
        &config_with_point_source("point"),
        MockLauncher::new(),
        FailurePolicy::Strict,
    )
    .await;

    assert_eq!(result.pipeline.state.status, RunStatus::Completed);
    assert!(result.pipeline.state.finished_at.is_some());
    for stage in &result.pipeline.stages {
        match &stage.state {
            StageState::Completed {
                started_at,
                completed_at,
                diagnostics,
            } => {
                assert!(started_at <= completed_at);
                assert!(diagnostics.is_none());
            }
            other => panic!("Stage {} not completed: {:?}", stage.id(), other),
        }
    }
}
