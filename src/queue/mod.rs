//! Time-bounded job queue.
//!
//! # Module Structure
//!
//! - [`store`]: the job store and dequeue policy
//! - [`dedupe`]: duplicate suppression on admission
//! - [`priority`]: configured category ranking
//! - [`stats`]: ingestion counters

pub mod dedupe;
pub mod priority;
pub mod stats;
pub mod store;

pub use dedupe::{AnonymousDedupe, DEFAULT_DUPLICATE_WINDOW_SECS, DedupePolicy};
pub use priority::{CategoryRanking, DEFAULT_RANKING};
pub use stats::{IngestStats, StatsSnapshot};
pub use store::{DEFAULT_TTL_MS, JobStore};
