//! rolegate CLI — query a status/role/action permission matrix.

mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rolegate_config::{MatrixDefinition, resolve_config_path};
use rolegate_matrix::{PermissionMatrix, snapshot_from_json, snapshot_to_json};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rolegate", version, about = "Query a status/role/action permission matrix")]
struct Cli {
    /// Matrix definition file (overrides ROLEGATE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Restore bindings from a JSON snapshot instead of the definition's bindings
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Enable verbose/debug logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether a role may perform an action in a status (exit 1 if denied)
    Check {
        status: String,
        role: String,
        action: String,
    },
    /// List the actions a role may perform in a status
    Actions { status: String, role: String },
    /// Show the raw role table of a status
    Roles { status: String },
    /// Show every status/role pair with its resolved actions
    Show,
    /// Print the current bindings as a JSON snapshot
    Export,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let matrix = load_matrix(cli.config, cli.snapshot.as_deref())?;

    match cli.command {
        Command::Check { status, role, action } => {
            let verdict = Verdict::of(&matrix, &status, &role, &action);
            println!("{}", verdict.as_str());
            Ok(ExitCode::from(verdict.exit_code()))
        }
        Command::Actions { status, role } => {
            if !matrix.status_exists(&status) {
                eprintln!("Warning: unknown status '{status}'");
            }
            for action in matrix.actions_for(&status, &role) {
                println!("{action}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Roles { status } => match render::format_roles(&matrix, &status) {
            Some(out) => {
                print!("{out}");
                Ok(ExitCode::SUCCESS)
            }
            None => {
                eprintln!("Unknown status: {status}");
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Show => {
            print!("{}", render::format_matrix(&matrix));
            Ok(ExitCode::SUCCESS)
        }
        Command::Export => {
            let json = snapshot_to_json(matrix.binding()).context("Failed to serialize snapshot")?;
            println!("{json}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Outcome of a `check` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Allowed,
    Denied,
}

impl Verdict {
    fn of(matrix: &PermissionMatrix, status: &str, role: &str, action: &str) -> Self {
        if matrix.is_allowed(status, role, action) {
            Self::Allowed
        } else {
            Self::Denied
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::Denied => "denied",
        }
    }

    fn exit_code(self) -> u8 {
        match self {
            Self::Allowed => 0,
            Self::Denied => 1,
        }
    }
}

/// Load the definition file and build the matrix, restoring a snapshot if given.
fn load_matrix(
    config: Option<PathBuf>,
    snapshot: Option<&std::path::Path>,
) -> Result<PermissionMatrix> {
    let config_path = resolve_config_path(config);
    tracing::debug!(path = %config_path.display(), "Loading matrix definition");

    let definition = MatrixDefinition::load(&config_path)
        .map_err(rolegate_types::RolegateError::from)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    match snapshot {
        Some(path) => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
            let binding = snapshot_from_json(&data)
                .with_context(|| format!("Invalid snapshot {}", path.display()))?;
            Ok(definition.build_with_snapshot(binding))
        }
        None => definition
            .build()
            .map_err(rolegate_types::RolegateError::from)
            .context("Failed to apply bindings"),
    }
}
