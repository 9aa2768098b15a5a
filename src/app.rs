use color_eyre::{eyre::eyre, Result};
use std::collections::HashMap;
use std::sync::Arc;

use cheatsheet::cache::SqliteStorage;
use cheatsheet::canvas::{Assignment, CachedCanvasClient};
use cheatsheet::clock::SystemClock;
use cheatsheet::config::Config;
use cheatsheet::jobs::JobClient;
use cheatsheet::sync::poll_to_completion;

use crate::Command;

/// CLI application: wires config, cache storage, and the Canvas client, and
/// executes one command.
pub struct App {
  config: Config,
  client: CachedCanvasClient<SqliteStorage>,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let storage = Arc::new(SqliteStorage::open()?);
    let client = CachedCanvasClient::new(&config, storage, Arc::new(SystemClock))?;

    Ok(Self { config, client })
  }

  pub async fn run(&self, command: Command) -> Result<()> {
    match command {
      Command::Courses { refresh } => self.courses(refresh).await,
      Command::Assignments { course_id, refresh } => self.assignments(course_id, refresh).await,
      Command::Job { id } => self.wait_for_job(&id).await,
      Command::Process { url, job_type } => self.process_link(&url, &job_type).await,
      Command::Submit {
        course_id,
        assignment_id,
        text,
      } => self.submit(course_id, assignment_id, text).await,
      Command::Watch => self.watch().await,
    }
  }

  async fn courses(&self, refresh: bool) -> Result<()> {
    let courses = if refresh {
      self.client.force_refresh_courses().await?
    } else {
      self.client.courses().await?
    };

    for course in &courses {
      println!("{:>8}  {}", course.id, course.display_name());
    }
    Ok(())
  }

  async fn assignments(&self, course_id: Option<u64>, refresh: bool) -> Result<()> {
    match course_id {
      Some(id) => {
        let assignments = if refresh {
          self.client.force_refresh_assignments(id).await?
        } else {
          self.client.assignments(id).await?
        };
        print_assignments(&assignments);
      }
      None => {
        // All courses: one paginated course fetch, then a bounded-concurrency
        // fan-out over the assignment lists.
        let courses = self.client.courses().await?;
        let ids: Vec<u64> = courses.iter().map(|c| c.id).collect();
        let by_course: HashMap<u64, Vec<Assignment>> =
          self.client.assignments_by_course(&ids).await;

        for course in &courses {
          println!("{} ({})", course.display_name(), course.id);
          if let Some(assignments) = by_course.get(&course.id) {
            print_assignments(assignments);
          }
          println!();
        }
      }
    }
    Ok(())
  }

  async fn wait_for_job(&self, job_id: &str) -> Result<()> {
    let jobs = self.jobs_client()?;

    let result = poll_to_completion(job_id, self.config.sync.poll_options(), || {
      jobs.get(job_id)
    })
    .await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
  }

  async fn process_link(&self, url: &str, job_type: &str) -> Result<()> {
    let jobs = self.jobs_client()?;

    let job_id = jobs.submit(url, job_type).await?;
    println!("submitted job {}", job_id);

    let result = poll_to_completion(&job_id, self.config.sync.poll_options(), || {
      jobs.get(&job_id)
    })
    .await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
  }

  async fn submit(&self, course_id: u64, assignment_id: u64, text: String) -> Result<()> {
    self
      .client
      .inner()
      .submit_assignment(course_id, assignment_id, text)
      .await?;
    println!("submitted assignment {} in course {}", assignment_id, course_id);
    Ok(())
  }

  async fn watch(&self) -> Result<()> {
    let courses = self.client.courses().await?;
    println!(
      "watching {} courses; refreshing in the background (Ctrl-C to stop)",
      courses.len()
    );

    let handle = self.client.start_background_refresh();
    tokio::signal::ctrl_c().await?;
    handle.stop();
    Ok(())
  }

  fn jobs_client(&self) -> Result<JobClient> {
    let jobs = self
      .config
      .jobs
      .as_ref()
      .ok_or_else(|| eyre!("no jobs endpoint configured; add a `jobs:` section to the config"))?;

    Ok(JobClient::new(&jobs.url, Config::automation_key())?)
  }
}

fn print_assignments(assignments: &[Assignment]) {
  for a in assignments {
    let due = a
      .due_at
      .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
      .unwrap_or_else(|| "no due date".to_string());
    let points = a
      .points_possible
      .map(|p| format!("{} pts", p))
      .unwrap_or_else(|| "ungraded".to_string());
    println!("  {:>10}  {:<50}  {}  {}", a.id, a.name, due, points);
  }
}
