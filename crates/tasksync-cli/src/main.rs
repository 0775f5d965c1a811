mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tasksync",
    about = "Keep a JSONC task ledger in sync with a markdown task outline",
    version,
    propagate_version = true
)]
struct Cli {
    /// Change directory (default: nearest ancestor holding tasks.md)
    #[arg(long, global = true, env = "TASKSYNC_DIR")]
    dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log files written and removed
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate the task documents from the outline
    Sync(cmd::sync::SyncArgs),

    /// Show outline sections and the capability each one maps to
    Sections,

    /// List tasks from the generated documents
    List {
        /// Root document to read, relative to the change directory
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Set a task's status
    Status {
        /// Task ID, e.g. 2.3
        id: String,
        /// pending, in_progress, or completed
        status: String,
        /// Root document to update, relative to the change directory
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let dir = root::resolve_change_dir(cli.dir.as_deref());

    let result = match cli.command {
        Commands::Sync(args) => cmd::sync::run(&dir, args, cli.json),
        Commands::Sections => cmd::sections::run(&dir, cli.json),
        Commands::List { output } => cmd::list::run(&dir, output.as_deref(), cli.json),
        Commands::Status { id, status, output } => {
            cmd::status::run(&dir, &id, &status, output.as_deref(), cli.json)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
