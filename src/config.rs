use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SyncError};
use crate::sync::{PageOptions, PollOptions, RetryPolicy};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub canvas: CanvasConfig,
  /// Automation-job collaborator; optional, the dashboard works without it.
  pub jobs: Option<JobsConfig>,
  #[serde(default)]
  pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanvasConfig {
  /// Base URL of the Canvas instance, e.g. `https://canvas.example.edu`.
  pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
  /// Base URL of the job submission/status endpoints.
  pub url: String,
}

/// Tuning for the synchronization layer. Defaults match the dashboard's
/// production values.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
  /// Records per page; 100 is the Canvas maximum.
  pub page_size: usize,
  /// Concurrent page requests per pagination round.
  pub parallel_pages: usize,
  /// Concurrent per-course assignment fetches.
  pub max_concurrent_courses: usize,
  /// Retries per unit of work after the initial attempt.
  pub max_retries: u32,
  /// Linear backoff base between retries.
  pub retry_backoff_ms: u64,
  /// How long cached collections stay valid.
  pub cache_ttl_minutes: i64,
  /// Background revalidation period.
  pub refresh_interval_minutes: u64,
  /// Fixed delay between job status polls.
  pub poll_interval_ms: u64,
  /// Status polls before a job is declared timed out.
  pub poll_max_attempts: u32,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      page_size: 100,
      parallel_pages: 2,
      max_concurrent_courses: 3,
      max_retries: 2,
      retry_backoff_ms: 1000,
      cache_ttl_minutes: 5,
      refresh_interval_minutes: 3,
      poll_interval_ms: 1000,
      poll_max_attempts: 30,
    }
  }
}

impl SyncConfig {
  pub fn page_options(&self) -> PageOptions {
    PageOptions {
      page_size: self.page_size,
      parallel_pages: self.parallel_pages,
    }
  }

  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_backoff_ms))
  }

  pub fn poll_options(&self) -> PollOptions {
    PollOptions {
      max_attempts: self.poll_max_attempts,
      interval: Duration::from_millis(self.poll_interval_ms),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./cheatsheet.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/cheatsheet/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(SyncError::Config(format!(
          "config file not found: {}",
          p.display()
        )));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(SyncError::Config(
        "no configuration file found; create one at ~/.config/cheatsheet/config.yaml".to_string(),
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("cheatsheet.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("cheatsheet").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| SyncError::Config(format!("failed to read {}: {}", path.display(), e)))?;
    serde_yaml::from_str(&contents)
      .map_err(|e| SyncError::Config(format!("failed to parse {}: {}", path.display(), e)))
  }

  /// Canvas API token, from the environment only — never from the file.
  pub fn canvas_token() -> Result<String> {
    std::env::var("CHEATSHEET_CANVAS_TOKEN")
      .or_else(|_| std::env::var("CANVAS_API_TOKEN"))
      .map_err(|_| {
        SyncError::Config(
          "Canvas API token not found. Set CHEATSHEET_CANVAS_TOKEN or CANVAS_API_TOKEN.".into(),
        )
      })
  }

  /// Optional API key for the job collaborator.
  pub fn automation_key() -> Option<String> {
    std::env::var("CHEATSHEET_AUTOMATION_KEY").ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn minimal_config_gets_default_tuning() {
    let config: Config = serde_yaml::from_str(
      "canvas:\n  url: https://canvas.example.edu\n",
    )
    .unwrap();

    assert_eq!(config.sync.page_size, 100);
    assert_eq!(config.sync.parallel_pages, 2);
    assert_eq!(config.sync.max_concurrent_courses, 3);
    assert_eq!(config.sync.poll_max_attempts, 30);
    assert!(config.jobs.is_none());
  }

  #[test]
  fn sync_overrides_are_honored() {
    let config: Config = serde_yaml::from_str(
      "canvas:\n  url: https://canvas.example.edu\njobs:\n  url: https://jobs.example.edu\nsync:\n  page_size: 50\n  refresh_interval_minutes: 10\n",
    )
    .unwrap();

    assert_eq!(config.sync.page_size, 50);
    assert_eq!(config.sync.refresh_interval_minutes, 10);
    // Unset fields keep their defaults
    assert_eq!(config.sync.max_retries, 2);
    assert_eq!(config.jobs.unwrap().url, "https://jobs.example.edu");
  }
}
