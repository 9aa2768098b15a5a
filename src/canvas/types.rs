//! Canvas wire types, deserialized straight from the REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A course the student is enrolled in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
  pub id: u64,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub course_code: Option<String>,
  #[serde(default)]
  pub workflow_state: Option<String>,
}

impl Course {
  /// Display name, falling back to the course code for unnamed (restricted)
  /// enrollments.
  pub fn display_name(&self) -> &str {
    self
      .name
      .as_deref()
      .or(self.course_code.as_deref())
      .unwrap_or("(unnamed course)")
  }
}

/// An assignment within a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
  pub id: u64,
  pub name: String,
  #[serde(default)]
  pub due_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub points_possible: Option<f64>,
  #[serde(default)]
  pub published: bool,
  #[serde(default)]
  pub workflow_state: Option<String>,
  #[serde(default)]
  pub html_url: Option<String>,
}

impl Assignment {
  /// Only published, non-deleted assignments are retained for display.
  pub fn is_displayable(&self) -> bool {
    self.published && self.workflow_state.as_deref() != Some("deleted")
  }
}

/// Body of an online-text-entry submission.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
  pub submission_type: &'static str,
  pub body: String,
}

impl Submission {
  pub fn online_text(body: impl Into<String>) -> Self {
    Self {
      submission_type: "online_text_entry",
      body: body.into(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn assignment(published: bool, workflow_state: &str) -> Assignment {
    Assignment {
      id: 1,
      name: "Essay 1".to_string(),
      due_at: None,
      points_possible: Some(100.0),
      published,
      workflow_state: Some(workflow_state.to_string()),
      html_url: None,
    }
  }

  #[test]
  fn deleted_and_unpublished_assignments_are_filtered() {
    assert!(assignment(true, "published").is_displayable());
    assert!(!assignment(true, "deleted").is_displayable());
    assert!(!assignment(false, "unpublished").is_displayable());
  }

  #[test]
  fn assignment_tolerates_missing_optional_fields() {
    let a: Assignment = serde_json::from_str(r#"{"id": 9, "name": "Quiz"}"#).unwrap();
    assert_eq!(a.id, 9);
    assert!(a.due_at.is_none());
    assert!(!a.published);
  }

  #[test]
  fn course_display_name_falls_back_to_code() {
    let course: Course =
      serde_json::from_str(r#"{"id": 1, "course_code": "CS101"}"#).unwrap();
    assert_eq!(course.display_name(), "CS101");
  }
}
