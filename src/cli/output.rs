//! CLI output formatting

use crate::{
    core::{Pipeline, Stage},
    execution::{ExecutionEvent, PipelineError},
};
use console::Emoji;
use std::io::{self, Write};

// Re-export style
pub use console::style;

// Emojis for output
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");

/// Column width of stage labels, so completion markers line up
pub const LABEL_WIDTH: usize = 60;

/// Marker printed after a stage label once the stage finished
pub const DONE_MARKER: &str = "...done";

/// Write the operator-facing rendering of an event.
///
/// A started stage leaves its line open so the completion marker lands on it.
pub fn write_execution_event<W: Write>(out: &mut W, event: &ExecutionEvent) -> io::Result<()> {
    match event {
        ExecutionEvent::StageStarted { label, .. } => {
            write!(out, "{:<width$}", label, width = LABEL_WIDTH)?;
            out.flush()
        }
        ExecutionEvent::StageCompleted {
            stage,
            missing_artifact,
        } => {
            writeln!(out, "{}", style(format!("{:<10}", DONE_MARKER)).green())?;
            if let Some(path) = missing_artifact {
                writeln!(
                    out,
                    "{}{} did not produce {}",
                    WARN,
                    style(stage).yellow(),
                    path.display()
                )?;
            }
            Ok(())
        }
        ExecutionEvent::StageSkipped { stage, reason } => writeln!(
            out,
            "{}{:<width$}",
            INFO,
            style(format!("Skipping {} ({})", stage, reason)).dim(),
            width = LABEL_WIDTH
        ),
        ExecutionEvent::StageWarning { stage, diagnostics } => {
            writeln!(out, "{}{} reported diagnostics:", WARN, style(stage).yellow())?;
            for line in diagnostics.lines() {
                writeln!(out, "    {}", style(line).dim())?;
            }
            Ok(())
        }
        // Close the open progress line before the failure report
        ExecutionEvent::StageFailed { .. } => writeln!(out),
        ExecutionEvent::RunStarted { .. } | ExecutionEvent::RunFinished { .. } => Ok(()),
    }
}

/// Final report of a successful run
pub fn format_success(pipeline: &Pipeline) -> String {
    format!(
        "{}\n   Output in: {}",
        style("Completed successfully!").green(),
        pipeline.config.working_dir_arg().to_string_lossy()
    )
}

/// Final report of a failed run; stage failures show the captured diagnostics
pub fn format_failure(error: &PipelineError) -> String {
    let detail = match error {
        PipelineError::Stage { source, .. } => source.to_string(),
        other => other.to_string(),
    };
    format!("===> Failed with error: \n{}", detail)
}

/// One line of a dry-run listing
pub fn format_plan_entry(stage: &Stage, applicable: bool) -> String {
    if applicable {
        format!(
            "{:<width$}{}",
            stage.label(),
            style(stage.command_line()).dim(),
            width = LABEL_WIDTH
        )
    } else {
        format!(
            "{:<width$}{}",
            stage.label(),
            style(format!("skipped ({})", stage.applicability.skip_reason())).yellow(),
            width = LABEL_WIDTH
        )
    }
}
