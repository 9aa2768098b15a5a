//! Client-side data synchronization core for a Canvas LMS student dashboard.
//!
//! The interesting parts live in [`sync`] (parallel pagination, bounded-
//! concurrency batching, background revalidation, job polling) and [`cache`]
//! (two-tier TTL caching); [`canvas`] and [`jobs`] wire those primitives to
//! the Canvas REST API and the automation-job collaborator.

pub mod cache;
pub mod canvas;
pub mod clock;
pub mod config;
pub mod error;
pub mod jobs;
pub mod sync;
