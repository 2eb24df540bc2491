//! Core domain models for a simulation run
//!
//! This module defines the configuration document, the stage plan
//! and the run state.

pub mod config;
pub mod pipeline;
pub mod stage;
pub mod state;
pub mod toolchain;

pub use config::{ConfigError, SimulationConfig};
pub use pipeline::*;
pub use stage::*;
pub use state::*;
pub use toolchain::Toolchain;
