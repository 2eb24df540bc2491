use anyhow::{Context, Result};
use molet::cli::output::*;
use molet::cli::Cli;
use molet::core::{Pipeline, SimulationConfig};
use molet::execution::ExecutionEngine;
use molet::launcher::SubprocessLauncher;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging on stderr; stdout carries the stage progress lines
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let config = SimulationConfig::from_file(&cli.config).with_context(|| {
        format!("Failed to load configuration {}", cli.config.display())
    })?;

    let mut pipeline =
        Pipeline::plan(config, &cli.toolchain()).context("Failed to plan simulation stages")?;

    if cli.dry_run {
        return print_plan(&cli, &pipeline);
    }

    let engine = ExecutionEngine::new(SubprocessLauncher::new(), cli.failure_mode.into());
    engine.add_event_handler(|event| {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = write_execution_event(&mut stdout, event) {
            error!("Failed to write progress: {}", e);
        }
    });

    match engine.execute(&mut pipeline).await {
        Ok(()) => {
            println!("{}", format_success(&pipeline));
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", format_failure(&e));
            std::process::exit(1);
        }
    }
}

fn print_plan(cli: &Cli, pipeline: &Pipeline) -> Result<()> {
    println!(
        "{} Planned stages for {} (run {})",
        INFO,
        style(pipeline.config.path().display()).bold(),
        style(&pipeline.state.run_id.to_string()[..8]).dim()
    );

    let toolchain = cli.toolchain();
    println!(
        "{} Stage programs from {} (scripts run with {})",
        INFO,
        style(toolchain.home().display()).bold(),
        style(toolchain.python()).bold()
    );

    for stage in &pipeline.stages {
        let applicable = pipeline
            .is_applicable(stage)
            .with_context(|| format!("Failed to evaluate stage {}", stage.id()))?;
        println!("  {}", format_plan_entry(stage, applicable));
    }

    println!(
        "{} Artifacts are written to {}",
        INFO,
        style(pipeline.working_dir().display()).cyan()
    );
    Ok(())
}
