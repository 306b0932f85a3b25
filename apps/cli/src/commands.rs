//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use docweave_core::pipeline::{self, ProgressReporter, RunConfig, RunSummary};
use docweave_shared::{AppConfig, init_config, load_config, load_config_from};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docweave: turn a markdown tree into an indexed knowledge base.
#[derive(Parser)]
#[command(
    name = "docweave",
    version,
    about = "Normalize, chunk, and index a markdown documentation tree.",
    long_about = None,
    args_conflicts_with_subcommands = true,
)]
pub(crate) struct Cli {
    /// Source directory (defaults to `defaults.source_dir`).
    pub source_dir: Option<PathBuf>,

    /// Output directory (defaults to `defaults.output_dir`).
    pub output_dir: Option<PathBuf>,

    /// Config file to use instead of `~/.docweave/docweave.toml`.
    #[arg(long, global = true, env = "DOCWEAVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Documents processed concurrently (overrides `pipeline.workers`).
    #[arg(long)]
    pub workers: Option<usize>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "docweave=info",
        1 => "docweave=debug",
        _ => "docweave=trace",
    }
}

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose)));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Config { action }) => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()).await,
        },
        None => {
            cmd_run(
                cli.source_dir,
                cli.output_dir,
                cli.config.as_deref(),
                cli.workers,
            )
            .await
        }
    }
}

/// Load the config file (explicit path or user default) and apply overrides.
fn resolve_config(path: Option<&Path>, workers: Option<usize>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(workers) = workers {
        config.pipeline.workers = workers;
    }
    config.validate()?;
    Ok(config)
}

async fn cmd_run(
    source_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    config_path: Option<&Path>,
    workers: Option<usize>,
) -> Result<()> {
    let config = resolve_config(config_path, workers)?;
    let source_dir = source_dir.unwrap_or_else(|| PathBuf::from(&config.defaults.source_dir));
    let output_dir = output_dir.unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir));

    let run_config = RunConfig::from_app_config(
        &config,
        source_dir,
        output_dir,
        env!("CARGO_PKG_VERSION"),
    );

    info!(
        source = %run_config.source_dir.display(),
        output = %run_config.output_dir.display(),
        workers = run_config.workers,
        "starting run"
    );

    let reporter = CliProgress::new();
    let summary = pipeline::run(&run_config, &reporter).await?;
    print_summary(&summary);

    // Validation failures are reported, not fatal.
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("  Knowledge base written to {}", summary.output_dir.display());
    println!("  Run:        {}", summary.run_id);
    println!("  Documents:  {}", summary.documents);
    println!("  Chunks:     {}", summary.chunks);
    println!("  Entities:   {}", summary.entities);
    println!("  Edges:      {}", summary.edges);
    println!("  Cycles:     {}", summary.cycles);
    println!(
        "  Validation: {} passed, {} failed ({} errors, {} warnings)",
        summary.files_passed, summary.files_failed, summary.total_errors, summary.total_warnings
    );
    if !summary.file_errors.is_empty() {
        println!("  Skipped:    {}", summary.file_errors.len());
        for error in &summary.file_errors {
            println!("    {} [{}]: {}", error.path, error.stage, error.message);
        }
    }
    println!("  Time:       {:.1}s", summary.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_done(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("[{current}/{total}] {path}"));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path, None)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_directories() {
        let cli = Cli::try_parse_from(["docweave", "notes", "out", "--workers", "2", "-vv"])
            .expect("parse");
        assert_eq!(cli.source_dir, Some(PathBuf::from("notes")));
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.workers, Some(2));
        assert_eq!(default_filter(cli.verbose), "docweave=trace");
        assert!(cli.command.is_none());
    }

    #[test]
    fn config_subcommand() {
        let cli = Cli::try_parse_from(["docweave", "config", "show", "--log-format", "json"])
            .expect("parse");
        assert_eq!(cli.log_format, LogFormat::Json);
        match cli.command {
            Some(Command::Config { action }) => assert_eq!(action, ConfigAction::Show),
            None => panic!("expected config subcommand"),
        }
    }

    #[test]
    fn defaults_when_no_arguments() {
        let cli = Cli::try_parse_from(["docweave"]).expect("parse");
        assert!(cli.source_dir.is_none());
        assert_eq!(cli.log_format, LogFormat::Text);
        assert_eq!(default_filter(cli.verbose), "docweave=info");
    }

    #[test]
    fn workers_override_is_validated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("docweave.toml");
        std::fs::write(&path, "[pipeline]\nworkers = 3\n").expect("write");

        let config = resolve_config(Some(path.as_path()), None).expect("config");
        assert_eq!(config.pipeline.workers, 3);
        assert_eq!(config.defaults.output_dir, "docs/_indexed");

        let config = resolve_config(Some(path.as_path()), Some(6)).expect("override");
        assert_eq!(config.pipeline.workers, 6);

        assert!(resolve_config(Some(path.as_path()), Some(0)).is_err());
    }
}
