//! Caching layer for remote Canvas collections.
//!
//! Two tiers: an in-memory TTL cache for the lifetime of the process, and a
//! persisted key/value store (SQLite) that survives restarts. Entries are
//! replaced wholesale on each successful fetch; nothing is partially mutated.
//! Expired or malformed entries read as a miss, never as an error.

mod layer;
mod memory;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use memory::{CachedCollection, TtlCache};
pub use storage::{CacheStorage, NoopStorage, PersistedEntry, SqliteStorage};
pub use traits::{CacheResult, CacheSource};
