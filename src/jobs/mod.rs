//! Asynchronous automation jobs: model and the submission/status client.
//!
//! Jobs are created by an out-of-process collaborator; this crate only
//! submits them and reads their status rows. A job transitions to
//! `completed` or `failed` exactly once; waiting for that transition is the
//! job of [`crate::sync::poll`].

mod client;

pub use client::JobClient;

use serde::{Deserialize, Serialize};

/// Status of an automation job as reported by the status endpoint.
///
/// The endpoint emits `processing | completed | failed`; a freshly submitted
/// job may also report `pending` or have no status row at all, both of which
/// readers treat the same as `processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
  Pending,
  Processing,
  Completed,
  Failed,
}

impl JobStatus {
  /// Whether no further transition will occur.
  pub fn is_terminal(self) -> bool {
    matches!(self, JobStatus::Completed | JobStatus::Failed)
  }
}

/// A job status row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsyncJob {
  pub id: String,
  pub status: JobStatus,
  /// Present once the job completes.
  #[serde(default)]
  pub result: Option<serde_json::Value>,
  /// Present once the job fails.
  #[serde(default)]
  pub error: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_deserializes_from_wire_names() {
    let job: AsyncJob =
      serde_json::from_str(r#"{"id":"j1","status":"processing"}"#).unwrap();
    assert_eq!(job.status, JobStatus::Processing);
    assert!(job.result.is_none());
    assert!(job.error.is_none());
  }

  #[test]
  fn terminal_states() {
    assert!(JobStatus::Completed.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
    assert!(!JobStatus::Processing.is_terminal());
    assert!(!JobStatus::Pending.is_terminal());
  }
}
