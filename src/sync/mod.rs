//! Data synchronization primitives: parallel pagination, bounded-concurrency
//! batch fetching, bounded retry, background revalidation, and job polling.
//!
//! Everything here is transport-agnostic: callers pass in async closures for
//! the actual network reads, which keeps the loops testable with scripted
//! fakes.

pub mod batch;
pub mod paginate;
pub mod poll;
pub mod refresh;
pub mod retry;

pub use batch::fetch_for_each;
pub use paginate::{fetch_all_pages, PageOptions};
pub use poll::{poll_to_completion, JobPoller, PollDecision, PollOptions};
pub use refresh::{revalidate, RefreshHandle};
pub use retry::{with_backoff, RetryPolicy};
