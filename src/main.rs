use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use symdex::config::{show_config, AppConfig};
use symdex::index::stats::show_stats;
use symdex::index::{IndexOptions, RootFailurePolicy};
use symdex::output;
use symdex::utils::get_log_path;
use symdex::workspace::Workspace;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "symdex")]
#[command(version, about = "Fuzzy symbol search over TypeScript projects")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Project root: a directory with tsconfig.json or a tsconfig file (repeatable)
    #[arg(short, long = "root", global = true)]
    roots: Vec<PathBuf>,

    /// Index the remaining roots when one fails to load
    #[arg(long, global = true)]
    skip_failed_roots: bool,

    /// Configuration file (defaults to the app data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at info level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search interactively (default)
    Search,
    /// Run one query and print the results
    Query {
        /// Query text
        #[arg(required = true)]
        text: Vec<String>,

        /// Maximum number of results
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Grouped)]
        format: Format,

        /// Re-rank the results with the configured AI service
        #[arg(long)]
        ai: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Show index statistics
    Stats,
    /// Show the effective configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Grouped,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Commands::Search));
    init_logging(cli.verbose, interactive)?;

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if cli.skip_failed_roots {
        config.index.root_failure = RootFailurePolicy::Skip;
    }

    if let Some(Commands::Config) = cli.command {
        return show_config(&config, cli.config.as_deref());
    }

    let roots = if cli.roots.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        cli.roots.clone()
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let options = IndexOptions {
        root_failure: config.index.root_failure,
        quiet: false,
    };
    let workspace = Workspace::build(&roots, &config, options).context("Failed to build index")?;

    match cli.command {
        None | Some(Commands::Search) => run_interactive(&workspace, &config, &runtime)?,
        Some(Commands::Query {
            text,
            limit,
            format,
            ai,
            no_color,
        }) => {
            let query = text.join(" ");
            let results = if ai {
                match workspace.reranker() {
                    Some(reranker) => match runtime.block_on(reranker.rerank(&query, limit)) {
                        Ok(results) => results,
                        Err(err) => {
                            warn!(error = %err, "AI ranking failed, using fuzzy results");
                            eprintln!("AI ranking failed ({}); showing fuzzy results", err);
                            workspace.engine().search(&query, limit)
                        }
                    },
                    None => {
                        let reason = workspace.ai_unavailable().unwrap_or("not configured");
                        eprintln!("AI ranking unavailable ({}); showing fuzzy results", reason);
                        workspace.engine().search(&query, limit)
                    }
                }
            } else {
                workspace.engine().search(&query, limit)
            };

            match format {
                Format::Grouped => output::print_grouped(&results, !no_color)?,
                Format::Json => output::print_json(&results)?,
            }
        }
        Some(Commands::Stats) => show_stats(workspace.elements())?,
        Some(Commands::Config) => {}
    }

    Ok(())
}

#[cfg(feature = "interactive")]
fn run_interactive(
    workspace: &Workspace,
    config: &AppConfig,
    runtime: &tokio::runtime::Runtime,
) -> Result<()> {
    symdex::tui::run(workspace, config, runtime.handle().clone())
}

#[cfg(not(feature = "interactive"))]
fn run_interactive(
    _workspace: &Workspace,
    _config: &AppConfig,
    _runtime: &tokio::runtime::Runtime,
) -> Result<()> {
    anyhow::bail!("Interactive search needs the `interactive` feature; use `symdex query`")
}

/// Batch commands log to stderr; the TUI owns the terminal, so it logs to a file
fn init_logging(verbose: bool, interactive: bool) -> Result<()> {
    let default = if verbose { "symdex=info" } else { "symdex=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if interactive {
        let path = get_log_path()?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    } else {
        builder.with_writer(io::stderr).init();
    }
    Ok(())
}
