//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::Parser;
use colored::control;
use thiserror::Error;

use cadra::core::config::Config;
use cadra::core::errors::CadraError;
use cadra::driver;
use cadra::logger::{ConsoleSink, Severity, Sink};

#[cfg(feature = "neo4j")]
use cadra::graph::Neo4jGraphAdapter;

/// CADRA — Complex Active Directory Risk Assessment.
#[derive(Debug, Parser)]
#[command(
    name = "cadra",
    author,
    version,
    about = "CADRA - Complex Active Directory Risk Assessment",
    long_about = None
)]
pub struct Cli {
    /// The name of the principal to assess.
    name: String,
    /// Override config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long)]
    json: bool,
    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
    /// Increase verbosity: show the per-edge permission breakdown.
    #[arg(short, long)]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration or graph-connectivity failure — always fatal.
    #[error("{0}")]
    Fatal(String),
    /// The requested principal wasn't found, or had no assessable outcome.
    #[error("{0}")]
    NotFound(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI: configuration/connectivity
    /// failures and a missing principal both terminate the run (§4.6); only
    /// a successful report exits 0.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Fatal(_) => 1,
            Self::NotFound(_) => 2,
            Self::Json(_) | Self::Io(_) => 3,
        }
    }
}

impl From<CadraError> for CliError {
    fn from(value: CadraError) -> Self {
        if matches!(value, CadraError::PrincipalNotFound { .. }) {
            Self::NotFound(value.to_string())
        } else {
            Self::Fatal(value.to_string())
        }
    }
}

/// Dispatch: load config, connect to the graph, run the assessment, print
/// the report in whichever mode `output_mode` resolves to.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }
    let mode = output_mode(cli);

    let config = Config::load(cli.config.as_deref())?;
    let mut sink = ConsoleSink::new(cli.quiet || mode == OutputMode::Json);

    let graph = build_graph_adapter(&config)?;
    let now_epoch_secs = current_epoch_secs();

    let report = driver::assess(&config, graph.as_ref(), &mut sink, &cli.name, now_epoch_secs)?;

    match mode {
        OutputMode::Json => {
            let payload = report.to_json(cli.verbose);
            println!("{}", serde_json::to_string(&payload)?);
        }
        OutputMode::Human => {
            print!("{}", report.render_human(cli.verbose));
        }
    }

    Ok(())
}

#[cfg(feature = "neo4j")]
fn build_graph_adapter(config: &Config) -> Result<Box<dyn cadra::graph::GraphAdapter>, CliError> {
    let adapter = Neo4jGraphAdapter::connect(&config.neo4j.uri, &config.neo4j.user, &config.neo4j.password)
        .map_err(|e| CliError::Fatal(e.to_string()))?;
    Ok(Box::new(adapter))
}

#[cfg(not(feature = "neo4j"))]
fn build_graph_adapter(_config: &Config) -> Result<Box<dyn cadra::graph::GraphAdapter>, CliError> {
    Err(CliError::Fatal(
        "no graph adapter available: the \"neo4j\" feature was not compiled in".to_string(),
    ))
}

fn current_epoch_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("CADRA_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }
    let fallback = if stdout_is_tty { OutputMode::Human } else { OutputMode::Json };
    match env_mode.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_always_wins() {
        assert_eq!(resolve_output_mode(true, Some("human"), true), OutputMode::Json);
    }

    #[test]
    fn non_tty_defaults_to_json_without_override() {
        assert_eq!(resolve_output_mode(false, None, false), OutputMode::Json);
    }

    #[test]
    fn tty_defaults_to_human_without_override() {
        assert_eq!(resolve_output_mode(false, None, true), OutputMode::Human);
    }

    #[test]
    fn env_override_forces_human_even_on_non_tty() {
        assert_eq!(resolve_output_mode(false, Some("human"), false), OutputMode::Human);
    }

    #[test]
    fn not_found_and_fatal_errors_have_distinct_exit_codes() {
        let not_found = CliError::NotFound("x".to_string());
        let fatal = CliError::Fatal("y".to_string());
        assert_ne!(not_found.exit_code(), fatal.exit_code());
        assert_eq!(fatal.exit_code(), 1);
    }
}
