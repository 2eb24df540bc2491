//! Pipeline domain model

use crate::core::{
    config::{ConfigError, SimulationConfig},
    stage::{Stage, StageKind},
    state::RunState,
    toolchain::Toolchain,
};
use std::path::Path;
use thiserror::Error;

/// Errors found while planning a run, before any stage is launched
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("stage '{stage}' reads the artifact of '{dependency}', which is not scheduled before it")]
    DependencyOrder {
        stage: StageKind,
        dependency: StageKind,
    },

    #[error("stage '{stage}' reads the artifact of conditional stage '{dependency}'")]
    ConditionalDependency {
        stage: StageKind,
        dependency: StageKind,
    },
}

/// Every dependency must be scheduled earlier and must always run
fn check_dependencies<F>(sequence: &[StageKind], dependencies_of: F) -> Result<(), PlanError>
where
    F: Fn(StageKind) -> &'static [StageKind],
{
    for (index, kind) in sequence.iter().enumerate() {
        for dep in dependencies_of(*kind) {
            if !sequence[..index].contains(dep) {
                return Err(PlanError::DependencyOrder {
                    stage: *kind,
                    dependency: *dep,
                });
            }
            if dep.applicability().is_conditional() {
                return Err(PlanError::ConditionalDependency {
                    stage: *kind,
                    dependency: *dep,
                });
            }
        }
    }
    Ok(())
}

/// A planned simulation run
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// The loaded configuration, read-only for the whole run
    pub config: SimulationConfig,

    /// Stages in execution order
    pub stages: Vec<Stage>,

    /// Execution state
    pub state: RunState,
}

impl Pipeline {
    /// Plan the standard stage sequence for a configuration
    pub fn plan(config: SimulationConfig, toolchain: &Toolchain) -> Result<Self, PlanError> {
        Self::from_sequence(config, toolchain, &StageKind::SEQUENCE)
    }

    fn from_sequence(
        config: SimulationConfig,
        toolchain: &Toolchain,
        sequence: &[StageKind],
    ) -> Result<Self, PlanError> {
        check_dependencies(sequence, StageKind::dependencies)?;

        // Resolve every predicate now so a bad field aborts before any stage runs
        for kind in sequence {
            kind.applicability().evaluate(&config)?;
        }

        let stages: Vec<Stage> = sequence
            .iter()
            .map(|kind| Stage::plan(*kind, &config, toolchain))
            .collect();

        let mut state = RunState::new();
        state.loaded(stages.len());

        Ok(Pipeline {
            config,
            stages,
            state,
        })
    }

    /// Get a stage by kind
    pub fn stage(&self, kind: StageKind) -> Option<&Stage> {
        self.stages.iter().find(|s| s.kind == kind)
    }

    /// Shared directory every stage writes into
    pub fn working_dir(&self) -> &Path {
        self.config.base_dir()
    }

    /// Whether a stage applies to this run's configuration
    pub fn is_applicable(&self, stage: &Stage) -> Result<bool, ConfigError> {
        stage.applicability.evaluate(&self.config)
    }
}
