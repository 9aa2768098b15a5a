//! Time source abstraction so cache expiry can be tested deterministically.

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A source of "now". Production code uses [`SystemClock`]; tests inject a
/// manually advanced clock instead of sleeping.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

pub type SharedClock = Arc<dyn Clock>;

#[cfg(test)]
pub mod test_support {
  use super::*;
  use chrono::Duration;
  use std::sync::Mutex;

  /// Test clock advanced explicitly by the test body.
  pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
  }

  impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Arc<Self> {
      Arc::new(Self {
        now: Mutex::new(now),
      })
    }

    pub fn advance(&self, by: Duration) {
      let mut now = self.now.lock().unwrap();
      *now += by;
    }
  }

  impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
      *self.now.lock().unwrap()
    }
  }
}
