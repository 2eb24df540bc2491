//! Command-line interface

pub mod output;

use crate::core::toolchain::{Toolchain, DEFAULT_PYTHON};
use crate::execution::FailurePolicy;
use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;

/// Run the MOLET lens-simulation stage pipeline
#[derive(Debug, Parser, Clone)]
#[command(name = "molet")]
#[command(version)]
#[command(about = "Run the lens-simulation stage pipeline for one configuration", long_about = None)]
pub struct Cli {
    /// Path to the simulation configuration (JSON, comments allowed)
    pub config: PathBuf,

    /// Root of the stage program installation
    #[arg(long, env = "MOLET_HOME")]
    pub home: PathBuf,

    /// Interpreter for script stages
    #[arg(long, env = "MOLET_PYTHON", default_value = DEFAULT_PYTHON)]
    pub python: String,

    /// How a failed stage is detected
    #[arg(long, value_enum, default_value_t = FailureModeArg::Strict)]
    pub failure_mode: FailureModeArg,

    /// Print the planned stages and exit without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Failure detection argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailureModeArg {
    /// Any diagnostic output fails the stage
    Strict,
    /// Only a non-zero exit status fails the stage
    ExitStatus,
}

impl From<FailureModeArg> for FailurePolicy {
    fn from(arg: FailureModeArg) -> Self {
        match arg {
            FailureModeArg::Strict => FailurePolicy::Strict,
            FailureModeArg::ExitStatus => FailurePolicy::ExitStatus,
        }
    }
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }

    /// Stage programs as configured on the command line
    pub fn toolchain(&self) -> Toolchain {
        Toolchain::new(self.home.clone()).with_python(self.python.clone())
    }
}
