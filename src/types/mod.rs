//! Core domain types for the job relay.

pub mod ids;
pub mod job;

pub use ids::{Category, JobId};
pub use job::{JobCandidate, JobRecord, UNKNOWN_NAME, UNKNOWN_PLAYERS, ZERO_VALUE};
