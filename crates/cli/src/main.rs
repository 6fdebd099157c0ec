//! `agentspec` — the CLI surface of §6.4: `fmt`, `validate`, `plan`,
//! `apply`, `diff`, `migrate`.

mod adapter;
mod commands;
mod config;
mod diagnostics;
mod loader;
mod pipeline;
mod plugins;

use agentspec_semantic::PolicyMode;
use clap::{Parser, Subcommand};
use commands::OutputFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "agentspec", version, about = "Declarative toolchain for AI agent systems")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the state file (default: .agentspec.state.json).
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    /// Emit debug-level logs.
    #[arg(long, global = true)]
    verbose: bool,

    /// Disable ANSI color in log output.
    #[arg(long, global = true)]
    no_color: bool,

    /// Correlation ID attached to every diagnostic and log line, for
    /// stitching a run's output back together across processes (§7).
    #[arg(long, global = true)]
    correlation_id: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Format IntentLang source files to canonical style.
    Fmt {
        #[arg(long)]
        check: bool,
        #[arg(long)]
        diff: bool,
        files: Vec<PathBuf>,
    },

    /// Parse and validate IntentLang source files.
    Validate {
        #[arg(long, default_value = "text")]
        format: String,
        files: Vec<PathBuf>,
    },

    /// Diff desired state (from an entry file) against persisted state.
    Plan {
        /// Root `.ias` file for the package (default: main.ias).
        #[arg(default_value = "main.ias")]
        entry: PathBuf,
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        env: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Apply a plan against the selected deploy target.
    Apply {
        #[arg(default_value = "main.ias")]
        entry: PathBuf,
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        env: Option<String>,
        #[arg(long)]
        auto_approve: bool,
        #[arg(long)]
        plan_file: Option<PathBuf>,
        #[arg(long, default_value = "enforce")]
        policy: String,
    },

    /// Report whether persisted state has drifted from desired state.
    Diff {
        #[arg(default_value = "main.ias")]
        entry: PathBuf,
        #[arg(long)]
        target: Option<String>,
    },

    /// One-way 1.0 -> 2.0 source rewrite.
    Migrate { files: Vec<PathBuf> },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    install_logging(cli.verbose, cli.no_color, cli.correlation_id.as_deref());

    let cwd = std::env::current_dir()?;
    let config = config::RuntimeConfig::resolve(&cwd, cli.state_file.as_deref())?;

    let code = match cli.command {
        Commands::Fmt { check, diff, files } => commands::fmt(&files, check, diff)?,
        Commands::Validate { format, files } => commands::validate(&files, &config, OutputFormat::parse(&format))?,
        Commands::Plan { entry, target, env, out, format } => {
            commands::plan(&entry, &config, target.as_deref(), env.as_deref(), out.as_deref(), OutputFormat::parse(&format))?
        }
        Commands::Apply { entry, target, env, auto_approve, plan_file, policy } => commands::apply(
            &entry,
            &config,
            target.as_deref(),
            env.as_deref(),
            auto_approve,
            plan_file.as_deref(),
            parse_policy_mode(&policy),
        )?,
        Commands::Diff { entry, target } => commands::diff(&entry, &config, target.as_deref())?,
        Commands::Migrate { files } => commands::migrate(&files)?,
    };

    std::process::exit(code);
}

fn parse_policy_mode(s: &str) -> PolicyMode {
    if s.eq_ignore_ascii_case("warn") {
        PolicyMode::Warn
    } else {
        PolicyMode::Enforce
    }
}

fn install_logging(verbose: bool, no_color: bool, correlation_id: Option<&str>) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_ansi(!no_color).with_target(false).init();
    if let Some(id) = correlation_id {
        tracing::info!(correlation_id = %id, "agentspec run started");
    }
}
