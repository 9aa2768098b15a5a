//! HTTP client for the automation-job collaborator.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SyncError};

use super::AsyncJob;

#[derive(Serialize)]
struct SubmitRequest<'a> {
  url: &'a str,
  job_type: &'a str,
}

#[derive(Deserialize)]
struct SubmitResponse {
  id: String,
}

/// Client for the job-submission endpoint and the status endpoint.
///
/// Submission returns synchronously with a created job id; all actual
/// processing happens out of process. The status reads here are the only
/// writes-free way this crate observes progress.
#[derive(Clone)]
pub struct JobClient {
  http: reqwest::Client,
  base_url: Url,
  api_key: Option<String>,
}

impl JobClient {
  pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
    Ok(Self {
      http: reqwest::Client::new(),
      base_url: Url::parse(base_url)?,
      api_key,
    })
  }

  /// Submit a link-processing job; returns the created job identifier.
  pub async fn submit(&self, target_url: &str, job_type: &str) -> Result<String> {
    let endpoint = self.base_url.join("jobs")?;

    let mut request = self.http.post(endpoint.clone()).json(&SubmitRequest {
      url: target_url,
      job_type,
    });
    if let Some(key) = &self.api_key {
      request = request.bearer_auth(key);
    }

    let response = request.send().await?;
    match response.status() {
      StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SyncError::Unauthorized),
      status if !status.is_success() => Err(SyncError::UnexpectedStatus {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
      }),
      _ => {
        let created: SubmitResponse = response.json().await?;
        Ok(created.id)
      }
    }
  }

  /// Read a job's status row. A job that was just submitted may not have a
  /// row yet; that reads as `None`, which pollers treat as still-processing.
  pub async fn get(&self, job_id: &str) -> Result<Option<AsyncJob>> {
    let endpoint = self.base_url.join(&format!("jobs/{}", job_id))?;

    let mut request = self.http.get(endpoint.clone());
    if let Some(key) = &self.api_key {
      request = request.bearer_auth(key);
    }

    let response = request.send().await?;
    match response.status() {
      StatusCode::NOT_FOUND => Ok(None),
      StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SyncError::Unauthorized),
      status if !status.is_success() => Err(SyncError::UnexpectedStatus {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
      }),
      _ => Ok(Some(response.json().await?)),
    }
  }
}
