//! Subprocess launcher - runs stage programs with tokio

use crate::launcher::{LaunchError, ProcessInvocation, ProcessLauncher, ProcessOutput};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Launches stage programs as child processes.
///
/// No timeout is applied; the launcher waits until the stage exits.
#[derive(Debug, Clone, Default)]
pub struct SubprocessLauncher;

impl SubprocessLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessLauncher for SubprocessLauncher {
    async fn launch(&self, invocation: &ProcessInvocation) -> Result<ProcessOutput, LaunchError> {
        let program = invocation.program.to_string_lossy().into_owned();
        debug!("Spawning {} with {} arguments", program, invocation.args.len());

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| LaunchError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let exit_code = output.status.code();

        debug!(
            "{} exited with {:?} ({} bytes stdout, {} bytes stderr)",
            program,
            exit_code,
            stdout.len(),
            stderr.len()
        );

        Ok(ProcessOutput::new(stdout, stderr, exit_code))
    }
}
