//! Fixed-interval polling for asynchronous job completion.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::jobs::{AsyncJob, JobStatus};

/// Polling budget. The hard upper bound on wait time is
/// `max_attempts * interval` — this is a fixed-interval poll, not backoff.
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
  pub max_attempts: u32,
  pub interval: Duration,
}

impl Default for PollOptions {
  fn default() -> Self {
    Self {
      max_attempts: 30,
      interval: Duration::from_millis(1000),
    }
  }
}

/// What the poller decided after observing one status read.
#[derive(Debug)]
pub enum PollDecision {
  /// Terminal success; carries the job's result payload.
  Complete(serde_json::Value),
  /// Terminal failure: the job failed or the polling budget ran out.
  Fail(SyncError),
  /// Not terminal yet; sleep this long and read again.
  Wait(Duration),
}

/// Explicit poller state machine.
///
/// The attempt counter lives here rather than in call-stack recursion, so a
/// driver is a plain loop and cancellation is just dropping the machine.
/// Feed each status read to [`observe`](JobPoller::observe) and act on the
/// decision.
#[derive(Debug)]
pub struct JobPoller {
  job_id: String,
  attempts: u32,
  options: PollOptions,
}

impl JobPoller {
  pub fn new(job_id: impl Into<String>, options: PollOptions) -> Self {
    Self {
      job_id: job_id.into(),
      attempts: 0,
      options,
    }
  }

  /// Status reads consumed so far.
  pub fn attempts(&self) -> u32 {
    self.attempts
  }

  /// Observe one status read. `None` means the status row does not exist
  /// yet, which is indistinguishable from — and treated as — still
  /// processing.
  pub fn observe(&mut self, row: Option<&AsyncJob>) -> PollDecision {
    match row {
      Some(job) if job.status == JobStatus::Completed => {
        PollDecision::Complete(job.result.clone().unwrap_or(serde_json::Value::Null))
      }
      Some(job) if job.status == JobStatus::Failed => PollDecision::Fail(SyncError::JobFailed {
        job_id: self.job_id.clone(),
        message: job
          .error
          .clone()
          .unwrap_or_else(|| "job failed without error detail".to_string()),
      }),
      _ => {
        self.attempts += 1;
        if self.attempts >= self.options.max_attempts {
          PollDecision::Fail(SyncError::JobTimeout {
            job_id: self.job_id.clone(),
            attempts: self.attempts,
          })
        } else {
          PollDecision::Wait(self.options.interval)
        }
      }
    }
  }
}

/// Drive a [`JobPoller`] against an async status read until terminal.
///
/// Each read is a pure network read; persisting the final status anywhere is
/// the caller's responsibility. Transient read failures consume an attempt
/// like a missing row; a non-transient failure (revoked key) aborts.
pub async fn poll_to_completion<F, Fut>(
  job_id: &str,
  options: PollOptions,
  fetch: F,
) -> Result<serde_json::Value>
where
  F: Fn() -> Fut,
  Fut: Future<Output = Result<Option<AsyncJob>>>,
{
  let mut poller = JobPoller::new(job_id, options);

  loop {
    let row = match fetch().await {
      Ok(row) => row,
      Err(e) if e.is_transient() => {
        debug!(job_id, error = %e, "status read failed, counting as still-processing");
        None
      }
      Err(e) => return Err(e),
    };

    match poller.observe(row.as_ref()) {
      PollDecision::Complete(result) => {
        debug!(job_id, attempts = poller.attempts(), "job completed");
        return Ok(result);
      }
      PollDecision::Fail(e) => return Err(e),
      PollDecision::Wait(interval) => tokio::time::sleep(interval).await,
    }
  }
}
