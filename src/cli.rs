use crate::config::settings::GraderConfig;
use crate::config::types::Report;
use crate::config::validator::validate_config;
use crate::judge::submission::Submission;
use crate::judge::GradingContext;
use crate::kernel::signal::SignalHandler;
use crate::safety::lock::WorkspaceLock;
use crate::safety::workspace::WorkspaceManager;
use crate::session::SimulationSession;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ./robograde.json when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Statically check an uploaded package and print the report
    Check {
        /// Upload directory; the package may be nested inside it
        path: PathBuf,
    },
    /// Check, then build and run the package in the simulator
    Simulate {
        /// Upload directory; the package may be nested inside it
        path: PathBuf,
        /// Entry node to run from the package
        #[arg(long)]
        node: Option<String>,
        /// Total simulation time in seconds, stabilization included
        #[arg(long)]
        duration: Option<u64>,
    },
    /// Remove every unprotected package from the build workspace
    Clean,
}

fn load_config(path: Option<&Path>) -> Result<GraderConfig> {
    let config = match path {
        Some(path) => GraderConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GraderConfig::load_default()?,
    };
    check_config(&config)?;
    Ok(config)
}

fn check_config(config: &GraderConfig) -> Result<()> {
    let validation = validate_config(config)?;
    for warning in &validation.warnings {
        log::warn!("Config: {}", warning);
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn run() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Check { path } => {
            let manifest = config.checker.manifest_file.clone();
            let report = match Submission::locate(&path, &manifest)? {
                Some(submission) => {
                    log::info!(
                        "Checking {} ({})",
                        submission.package_name(),
                        submission.root().display()
                    );
                    GradingContext::check(submission, &config.checker)?.report
                }
                None => {
                    log::warn!("No {} under {}", manifest, path.display());
                    Report::no_package(&manifest)
                }
            };
            print_json(&report)
        }
        Commands::Simulate {
            path,
            node,
            duration,
        } => {
            if let Some(duration) = duration {
                config.simulation.duration_secs = duration;
                check_config(&config)?;
            }
            let node = node.unwrap_or_else(|| config.simulation.node_name.clone());

            let manifest = &config.checker.manifest_file;
            let submission = Submission::locate(&path, manifest)?.ok_or_else(|| {
                anyhow!(
                    "No {} found under {}; refusing to simulate",
                    manifest,
                    path.display()
                )
            })?;
            let context = GradingContext::check(submission, &config.checker)?;
            log::info!("Static check score: {}", context.report.score);

            let handler = SignalHandler::init().map_err(|e| anyhow!(e))?;
            let lock = WorkspaceLock::acquire(&config.workspace.root)?;
            log::info!("Holding workspace lock {}", lock.path().display());

            let outcome = SimulationSession::from_config(&context, &config, &node)?
                .with_shutdown(handler)
                .run();
            drop(lock);

            print_json(&serde_json::json!({
                "report": context.report,
                "session": outcome,
            }))?;

            if outcome.is_completed() {
                Ok(())
            } else {
                Err(anyhow!(
                    "Simulation session {} ended in {}: {}",
                    outcome.submission_id,
                    outcome.state,
                    outcome.failure.as_deref().unwrap_or("unknown failure")
                ))
            }
        }
        Commands::Clean => {
            let _lock = WorkspaceLock::acquire(&config.workspace.root)?;
            let report = WorkspaceManager::new(&config.workspace).clean()?;
            print_json(&report)
        }
    }
}
