//! Canvas client with transparent caching and background revalidation.

use chrono::Duration as ChronoDuration;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheLayer, CacheStorage};
use crate::clock::SharedClock;
use crate::config::Config;
use crate::error::Result;
use crate::sync::{fetch_for_each, revalidate, RefreshHandle};

use super::client::CanvasClient;
use super::types::{Assignment, Course};

const COURSES_KEY: &str = "courses";

fn assignments_key(course_id: u64) -> String {
  format!("assignments_{}", course_id)
}

/// Cached wrapper around [`CanvasClient`].
///
/// Reads go through a two-tier cache; cache hits trigger an opportunistic
/// background revalidation so displayed data converges on the remote state
/// without a loading round-trip. Cache tiers are only ever written with
/// successfully fetched data — a failed refresh leaves the previous entry
/// in place.
pub struct CachedCanvasClient<S: CacheStorage + 'static> {
  inner: CanvasClient,
  courses: CacheLayer<Course, S>,
  assignments: CacheLayer<Assignment, S>,
  refresh_interval: Duration,
  max_concurrent_courses: usize,
}

impl<S: CacheStorage + 'static> CachedCanvasClient<S> {
  pub fn new(config: &Config, storage: Arc<S>, clock: SharedClock) -> Result<Self> {
    let inner = CanvasClient::new(config)?;
    let ttl = ChronoDuration::minutes(config.sync.cache_ttl_minutes);

    Ok(Self {
      inner,
      courses: CacheLayer::new(storage.clone(), clock.clone()).with_ttl(ttl),
      assignments: CacheLayer::new(storage, clock).with_ttl(ttl),
      refresh_interval: Duration::from_secs(config.sync.refresh_interval_minutes * 60),
      max_concurrent_courses: config.sync.max_concurrent_courses,
    })
  }

  pub fn inner(&self) -> &CanvasClient {
    &self.inner
  }

  /// The student's active courses, cache-first.
  pub async fn courses(&self) -> Result<Vec<Course>> {
    let result = self
      .courses
      .fetch(COURSES_KEY, || self.inner.list_courses())
      .await?;

    if result.from_cache() {
      let layer = self.courses.clone();
      let inner = self.inner.clone();
      revalidate(move || async move {
        layer
          .refresh(COURSES_KEY, || inner.list_courses())
          .await
          .map(|_| ())
      });
    }

    Ok(result.data)
  }

  /// Displayable assignments for one course, cache-first.
  pub async fn assignments(&self, course_id: u64) -> Result<Vec<Assignment>> {
    let key = assignments_key(course_id);
    let result = self
      .assignments
      .fetch(&key, || self.inner.list_assignments(course_id))
      .await?;

    if result.from_cache() {
      let layer = self.assignments.clone();
      let inner = self.inner.clone();
      revalidate(move || async move {
        layer
          .refresh(&key, || inner.list_assignments(course_id))
          .await
          .map(|_| ())
      });
    }

    Ok(result.data)
  }

  /// Assignments for many courses. Cached courses are served as-is; the
  /// rest are fetched in bounded-concurrency chunks. Every requested id is
  /// present in the result, with an empty list for a course whose fetch
  /// failed (such failures are not written to the cache).
  pub async fn assignments_by_course(
    &self,
    course_ids: &[u64],
  ) -> HashMap<u64, Vec<Assignment>> {
    let mut out = HashMap::with_capacity(course_ids.len());
    let mut missing = Vec::new();

    for &id in course_ids {
      match self.assignments.peek(&assignments_key(id)) {
        Some(hit) => {
          out.insert(id, hit.data);
        }
        None => missing.push(id),
      }
    }

    let fetched = fetch_for_each(&missing, self.max_concurrent_courses, |id| async move {
      self
        .assignments
        .refresh(&assignments_key(id), || self.inner.list_assignments(id))
        .await
    })
    .await;
    out.extend(fetched);

    out
  }

  /// Drop both caches for `course_id`-independent course data and refetch.
  pub async fn force_refresh_courses(&self) -> Result<Vec<Course>> {
    self.courses.invalidate(COURSES_KEY)?;
    self
      .courses
      .refresh(COURSES_KEY, || self.inner.list_courses())
      .await
  }

  /// Explicit refresh of one course's assignments.
  pub async fn force_refresh_assignments(&self, course_id: u64) -> Result<Vec<Assignment>> {
    let key = assignments_key(course_id);
    self.assignments.invalidate(&key)?;
    self
      .assignments
      .refresh(&key, || self.inner.list_assignments(course_id))
      .await
  }

  /// Start the periodic revalidation task: every `refresh_interval` the
  /// course list and each course's assignments are refetched and, on
  /// success, silently swapped into the cache. Failures are logged and
  /// never surfaced. The returned handle cancels the timer when dropped.
  pub fn start_background_refresh(&self) -> RefreshHandle {
    let inner = self.inner.clone();
    let courses = self.courses.clone();
    let assignments = self.assignments.clone();
    let max_concurrent = self.max_concurrent_courses;

    RefreshHandle::spawn(self.refresh_interval, move || {
      let inner = inner.clone();
      let courses = courses.clone();
      let assignments = assignments.clone();

      async move {
        let course_list = courses.refresh(COURSES_KEY, || inner.list_courses()).await?;
        let ids: Vec<u64> = course_list.iter().map(|c| c.id).collect();

        // Per-course refresh through the cache layer: only successful
        // fetches are stored, a failed course keeps its previous entry.
        let assignments = &assignments;
        let inner = &inner;
        fetch_for_each(&ids, max_concurrent, |id| async move {
          assignments
            .refresh(&assignments_key(id), || inner.list_assignments(id))
            .await
        })
        .await;

        Ok(())
      }
    })
  }
}
