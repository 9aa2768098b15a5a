//! Canvas LMS client: wire types, the REST client, and the cached wrapper
//! the rest of the application talks to.

mod cached;
mod client;
mod types;

pub use cached::CachedCanvasClient;
pub use client::CanvasClient;
pub use types::{Assignment, Course, Submission};
