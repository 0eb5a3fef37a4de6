//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::output::{Output, OutputFormat};
use super::{query, todo_cmd};
use crate::storage::Workspace;

#[derive(Parser)]
#[command(name = "todo")]
#[command(author, version, about = "Tasks and projects as a dependency graph")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Task file (overrides the configured data_file)
    #[arg(long, short = 'F', global = true, env = "TODO_FILE")]
    pub file: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "TODO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (defaults to the configured default_format)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task
    ///
    /// Examples:
    ///   todo add "Write Thesis" -p important -c University
    ///   todo add "Literature Review" --deadline 2025-11-01 --blocks t-7f2b
    Add(todo_cmd::AddArgs),

    /// List tasks, optionally filtered and sorted
    List(todo_cmd::ListArgs),

    /// Show task details
    Show {
        /// Task ID or unique prefix
        id: String,
    },

    /// Mark a task as done
    Done {
        /// Task ID or unique prefix
        id: String,

        /// Complete even if dependencies are still open
        #[arg(long)]
        force: bool,

        /// Hours actually spent
        #[arg(long)]
        actual: Option<f64>,
    },

    /// Reopen a done task (and any done tasks depending on it)
    Undone {
        /// Task ID or unique prefix
        id: String,
    },

    /// Mark a task as in progress
    Start {
        /// Task ID or unique prefix
        id: String,
    },

    /// Remove a task
    Rm {
        /// Task ID or unique prefix
        id: String,
    },

    /// Add a dependency between tasks
    Dep {
        /// Task that will be blocked
        task: String,

        /// Task that must be completed first
        depends_on: String,
    },

    /// Remove a dependency
    Undep {
        /// Task to unblock
        task: String,

        /// Dependency to remove
        depends_on: String,
    },

    /// Move a deadline later
    Extend {
        /// Task ID or unique prefix
        id: String,

        /// New deadline (YYYY-MM-DD, today, tomorrow or +N days)
        date: String,
    },

    /// Change task attributes
    Edit(todo_cmd::EditArgs),

    /// Raise priorities of open tasks as their deadline approaches
    Escalate,

    /// Show open tasks whose dependencies are all done
    Ready,

    /// Show open tasks waiting on dependencies
    Blocked,

    /// Show open tasks past their deadline
    Overdue,

    /// Show open tasks due soon
    Upcoming {
        /// Days ahead to include (defaults to the configured upcoming_days)
        #[arg(long, short)]
        days: Option<i64>,
    },

    /// Show collection statistics
    Stats {
        /// Restrict the average completion time to a category or tag
        #[arg(long)]
        scope: Option<String>,
    },

    /// List tasks with dependencies before dependents
    Order,
}

/// Installs the stderr log subscriber
///
/// `--verbose` enables debug events for this crate; otherwise `RUST_LOG`
/// decides, defaulting to warnings only.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("todo_graph=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let workspace = Workspace::open(cli.config, cli.file)?;
    let output = Output::new(cli.format.unwrap_or(workspace.config().default_format));

    tracing::debug!("todo starting");

    match cli.command {
        Commands::Add(args) => todo_cmd::add(&workspace, &output, args)?,
        Commands::List(args) => todo_cmd::list(&workspace, &output, args)?,
        Commands::Show { id } => todo_cmd::show(&workspace, &output, &id)?,
        Commands::Done { id, force, actual } => {
            todo_cmd::done(&workspace, &output, &id, force, actual)?
        }
        Commands::Undone { id } => todo_cmd::undone(&workspace, &output, &id)?,
        Commands::Start { id } => todo_cmd::start(&workspace, &output, &id)?,
        Commands::Rm { id } => todo_cmd::remove(&workspace, &output, &id)?,
        Commands::Dep { task, depends_on } => {
            todo_cmd::add_dependency(&workspace, &output, &task, &depends_on)?
        }
        Commands::Undep { task, depends_on } => {
            todo_cmd::remove_dependency(&workspace, &output, &task, &depends_on)?
        }
        Commands::Extend { id, date } => todo_cmd::extend(&workspace, &output, &id, &date)?,
        Commands::Edit(args) => todo_cmd::edit(&workspace, &output, args)?,
        Commands::Escalate => todo_cmd::escalate(&workspace, &output)?,

        Commands::Ready => query::ready(&workspace, &output)?,
        Commands::Blocked => query::blocked(&workspace, &output)?,
        Commands::Overdue => query::overdue(&workspace, &output)?,
        Commands::Upcoming { days } => query::upcoming(&workspace, &output, days)?,
        Commands::Stats { scope } => query::stats(&workspace, &output, scope.as_deref())?,
        Commands::Order => query::order(&workspace, &output)?,
    }

    tracing::debug!("command completed");
    Ok(())
}
