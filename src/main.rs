mod app;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cheatsheet::config::Config;

#[derive(Parser, Debug)]
#[command(name = "cheatsheet")]
#[command(about = "Canvas course/assignment sync and automation-job runner")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/cheatsheet/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// List active courses
  Courses {
    /// Bypass the cache and refetch
    #[arg(short, long)]
    refresh: bool,
  },
  /// List assignments for one course, or for all courses
  Assignments {
    /// Course id; omit to list assignments across all courses
    course_id: Option<u64>,
    /// Bypass the cache and refetch
    #[arg(short, long)]
    refresh: bool,
  },
  /// Wait for an existing automation job to finish and print its result
  Job {
    /// Job identifier
    id: String,
  },
  /// Submit a link-processing job and wait for its result
  Process {
    /// URL to process
    url: String,
    /// Job type understood by the automation backend
    #[arg(short, long, default_value = "summarize")]
    job_type: String,
  },
  /// Submit assignment text to Canvas
  Submit {
    course_id: u64,
    assignment_id: u64,
    /// Submission body (online text entry)
    text: String,
  },
  /// Keep the cache warm with periodic background refreshes
  Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cheatsheet=info")),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;

  let app = app::App::new(config)?;
  app.run(args.command).await
}
