//! Stage domain model

use crate::core::{
    config::{ConfigError, SimulationConfig, POINT_SOURCE_TYPE},
    state::StageState,
    toolchain::Toolchain,
};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

/// Value of a discriminator field that disables the stage it guards
pub const SENTINEL_NONE: &str = "none";

/// The stages of a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Angular diameter distances
    Distances,
    /// Lensed images of the extended source
    ExtendedSource,
    /// Lensed images of a point-like source
    PointSource,
    /// Light profile of the lens galaxy
    LensLight,
}

impl StageKind {
    /// Fixed execution order
    pub const SEQUENCE: [StageKind; 4] = [
        StageKind::Distances,
        StageKind::ExtendedSource,
        StageKind::PointSource,
        StageKind::LensLight,
    ];

    pub fn id(self) -> &'static str {
        match self {
            StageKind::Distances => "distances",
            StageKind::ExtendedSource => "extended_source",
            StageKind::PointSource => "point_source",
            StageKind::LensLight => "lens_light",
        }
    }

    /// Progress label shown to the operator
    pub fn label(self) -> &'static str {
        match self {
            StageKind::Distances => "Getting angular diameter distances...",
            StageKind::ExtendedSource => "Getting extended source lensed features...",
            StageKind::PointSource => "Getting point-like source lensed images...",
            StageKind::LensLight => "Getting light profile of the lens...",
        }
    }

    /// File this stage writes into the working directory
    pub fn artifact(self) -> &'static str {
        match self {
            StageKind::Distances => "angular_diameter_distances.json",
            StageKind::ExtendedSource => "lensed_image_super.fits",
            StageKind::PointSource => "caustics.json",
            StageKind::LensLight => "lens_light_super.fits",
        }
    }

    /// Stages whose artifacts this stage reads, in argument order
    pub fn dependencies(self) -> &'static [StageKind] {
        match self {
            StageKind::Distances => &[],
            StageKind::ExtendedSource | StageKind::PointSource | StageKind::LensLight => {
                &[StageKind::Distances]
            }
        }
    }

    pub fn applicability(self) -> Applicability {
        match self {
            StageKind::PointSource => Applicability::UnlessEquals {
                pointer: POINT_SOURCE_TYPE,
                sentinel: SENTINEL_NONE,
            },
            _ => Applicability::Always,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Decides whether a stage runs for a given configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    /// Stage always runs
    Always,
    /// Stage runs unless the string at `pointer` equals `sentinel`
    UnlessEquals {
        pointer: &'static str,
        sentinel: &'static str,
    },
}

impl Applicability {
    pub fn evaluate(&self, config: &SimulationConfig) -> Result<bool, ConfigError> {
        match self {
            Applicability::Always => Ok(true),
            Applicability::UnlessEquals { pointer, sentinel } => {
                Ok(config.str_field(pointer)? != *sentinel)
            }
        }
    }

    pub fn is_conditional(&self) -> bool {
        !matches!(self, Applicability::Always)
    }

    /// Why a stage guarded by this rule did not run
    pub fn skip_reason(&self) -> String {
        match self {
            Applicability::Always => "not applicable".to_string(),
            Applicability::UnlessEquals { pointer, sentinel } => {
                format!("{} is \"{}\"", pointer, sentinel)
            }
        }
    }
}

/// A planned stage invocation
#[derive(Debug, Clone)]
pub struct Stage {
    pub kind: StageKind,

    /// Executable to launch
    pub program: OsString,

    /// Full argument list, one token per argument
    pub args: Vec<OsString>,

    /// Where the stage writes its artifact
    pub artifact: PathBuf,

    pub applicability: Applicability,

    /// Runtime state
    pub state: StageState,
}

impl Stage {
    /// Build the invocation for `kind`.
    ///
    /// Arguments are `[leading..., config, dependency artifacts..., working dir]`.
    pub fn plan(kind: StageKind, config: &SimulationConfig, toolchain: &Toolchain) -> Self {
        let program = toolchain.program_for(kind);

        let mut args = program.leading_args;
        args.push(config.path().as_os_str().to_os_string());
        for dep in kind.dependencies() {
            args.push(config.artifact_path(dep.artifact()).into_os_string());
        }
        args.push(config.working_dir_arg());

        Stage {
            kind,
            program: program.program,
            args,
            artifact: config.artifact_path(kind.artifact()),
            applicability: kind.applicability(),
            state: StageState::Pending,
        }
    }

    pub fn id(&self) -> &'static str {
        self.kind.id()
    }

    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    /// Printable form of the command, for logs and dry runs
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
