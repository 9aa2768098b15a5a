use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::sync::{fetch_all_pages, with_backoff, PageOptions, RetryPolicy};

use super::types::{Assignment, Course, Submission};

#[derive(serde::Serialize)]
struct SubmissionBody {
  submission: Submission,
}

/// Canvas REST API client.
///
/// All list endpoints are paginated; end-of-data is inferred from short
/// pages, so every listing goes through [`fetch_all_pages`].
#[derive(Clone)]
pub struct CanvasClient {
  http: reqwest::Client,
  base_url: Url,
  token: String,
  pages: PageOptions,
  retry: RetryPolicy,
}

impl CanvasClient {
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::canvas_token()?;

    Ok(Self {
      http: reqwest::Client::new(),
      base_url: Url::parse(&config.canvas.url)?,
      token,
      pages: config.sync.page_options(),
      retry: config.sync.retry_policy(),
    })
  }

  /// List the student's active courses.
  pub async fn list_courses(&self) -> Result<Vec<Course>> {
    fetch_all_pages(self.pages, |page| {
      self.get_page::<Course>("courses", &[("enrollment_state", "active")], page)
    })
    .await
  }

  /// List the displayable assignments of one course, with this client's
  /// retry budget around the whole paginated fetch.
  pub async fn list_assignments(&self, course_id: u64) -> Result<Vec<Assignment>> {
    let path = format!("courses/{}/assignments", course_id);

    let assignments = with_backoff(self.retry, || {
      fetch_all_pages(self.pages, |page| {
        self.get_page::<Assignment>(&path, &[], page)
      })
    })
    .await?;

    Ok(
      assignments
        .into_iter()
        .filter(Assignment::is_displayable)
        .collect(),
    )
  }

  /// Submit assignment text as an online-text-entry submission.
  pub async fn submit_assignment(
    &self,
    course_id: u64,
    assignment_id: u64,
    body: impl Into<String>,
  ) -> Result<()> {
    let endpoint = self.base_url.join(&format!(
      "api/v1/courses/{}/assignments/{}/submissions",
      course_id, assignment_id
    ))?;

    let response = self
      .http
      .post(endpoint.clone())
      .bearer_auth(&self.token)
      .json(&SubmissionBody {
        submission: Submission::online_text(body.into()),
      })
      .send()
      .await?;

    self.check_status(&endpoint, response.status())?;
    Ok(())
  }

  async fn get_page<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, &str)],
    page: u32,
  ) -> Result<Vec<T>> {
    let mut url = self.base_url.join(&format!("api/v1/{}", path))?;
    {
      let mut pairs = url.query_pairs_mut();
      for (key, value) in query {
        pairs.append_pair(key, value);
      }
      pairs.append_pair("per_page", &self.pages.page_size.to_string());
      pairs.append_pair("page", &page.to_string());
    }

    let response = self.http.get(url.clone()).bearer_auth(&self.token).send().await?;
    self.check_status(&url, response.status())?;

    Ok(response.json().await?)
  }

  fn check_status(&self, endpoint: &Url, status: StatusCode) -> Result<()> {
    match status {
      StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SyncError::Unauthorized),
      s if !s.is_success() => Err(SyncError::UnexpectedStatus {
        endpoint: endpoint.to_string(),
        status: s.as_u16(),
      }),
      _ => Ok(()),
    }
  }
}
