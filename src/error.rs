//! Error taxonomy for the sync layer.
//!
//! Unit-level failures (one page, one course, one job) are contained by the
//! sync primitives and degrade to empty results; the variants here are what
//! remains visible to callers once that containment has happened.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
  /// The upstream rejected our credentials (HTTP 401/403). Surfaced as a
  /// distinct, user-recoverable state: the fix is reconnecting the account,
  /// not retrying the request.
  #[error("Canvas rejected the API token. Reconnect your Canvas account and try again.")]
  Unauthorized,

  #[error("HTTP request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("Unexpected response from {endpoint}: HTTP {status}")]
  UnexpectedStatus { endpoint: String, status: u16 },

  /// Every page request in a pagination round failed. Distinct from a short
  /// final page: this is a whole-operation failure, not end-of-data.
  #[error("All {pages} page requests in a round failed (first error: {first_error})")]
  PageRoundFailed { pages: usize, first_error: String },

  /// The remote job reached the `failed` terminal state.
  #[error("Job {job_id} failed: {message}")]
  JobFailed { job_id: String, message: String },

  /// The job never reached a terminal state within the polling budget.
  #[error("Job {job_id} still processing after {attempts} attempts; giving up")]
  JobTimeout { job_id: String, attempts: u32 },

  #[error("Cache storage error: {0}")]
  Storage(#[from] rusqlite::Error),

  #[error("Invalid response payload: {0}")]
  Decode(#[from] serde_json::Error),

  #[error("Invalid URL: {0}")]
  Url(#[from] url::ParseError),

  #[error("Configuration error: {0}")]
  Config(String),
}

impl SyncError {
  /// Whether this failure is worth retrying at all. Auth failures and
  /// explicit job failures are not: retrying them cannot succeed.
  pub fn is_transient(&self) -> bool {
    !matches!(
      self,
      SyncError::Unauthorized | SyncError::JobFailed { .. } | SyncError::Config(_)
    )
  }
}

pub type Result<T> = std::result::Result<T, SyncError>;
