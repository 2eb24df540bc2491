//! Location of the stage collaborator programs

use crate::core::stage::StageKind;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Interpreter used for script stages when none is configured
pub const DEFAULT_PYTHON: &str = "python";

/// Where the stage programs are installed and how to launch them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Root of the collaborator installation
    home: PathBuf,

    /// Interpreter for script stages (e.g. "python", "/usr/bin/python3")
    python: String,
}

/// How a stage program is started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageProgram {
    /// Executable to launch
    pub program: OsString,

    /// Arguments that precede the stage contract arguments
    pub leading_args: Vec<OsString>,
}

impl Toolchain {
    pub fn new<P: Into<PathBuf>>(home: P) -> Self {
        Self {
            home: home.into(),
            python: DEFAULT_PYTHON.to_string(),
        }
    }

    pub fn with_python(mut self, python: String) -> Self {
        self.python = python;
        self
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn python(&self) -> &str {
        &self.python
    }

    /// Resolve the program that implements a stage
    pub fn program_for(&self, kind: StageKind) -> StageProgram {
        match kind {
            StageKind::Distances => StageProgram {
                program: OsString::from(&self.python),
                leading_args: vec![self
                    .home
                    .join("cosmology")
                    .join("angular_diameter_distances.py")
                    .into_os_string()],
            },
            StageKind::ExtendedSource => self.binary(&["lensed_extended_source", "vkl_fproject", "bin", "fproject"]),
            StageKind::PointSource => self.binary(&["lensed_point_source", "vkl_point_source", "bin", "point_source"]),
            StageKind::LensLight => self.binary(&["lens_light", "vkl_lens_light", "bin", "lens_light"]),
        }
    }

    fn binary(&self, components: &[&str]) -> StageProgram {
        let path = components
            .iter()
            .fold(self.home.clone(), |path, part| path.join(part));
        StageProgram {
            program: path.into_os_string(),
            leading_args: Vec::new(),
        }
    }
}
