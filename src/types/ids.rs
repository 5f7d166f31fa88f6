//! Newtype wrappers for domain identifiers.
//!
//! These keep a server instance id from being mixed up with a category name
//! (both are plain strings on the wire) and make signatures self-documenting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a joinable game server instance.
///
/// Extracted ids are UUID-shaped (8-4-4-4-12 hex groups), but the type does
/// not enforce that: records built by hand or by other producers may carry
/// any string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Creates a new JobId from a string.
    ///
    /// Note: This does not validate the format.
    pub fn new(s: impl Into<String>) -> Self {
        JobId(s.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares two ids ignoring ASCII case.
    ///
    /// Producers are inconsistent about hex case, and `ABCD...` and `abcd...`
    /// name the same server.
    pub fn same_server(&self, other: &JobId) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        JobId(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        JobId(s.to_string())
    }
}

/// The ingestion channel (tier) a job arrived on.
///
/// Assigned by the endpoint the payload was posted to, never parsed from the
/// payload itself. Doubles as the priority key when dequeuing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(pub String);

impl Category {
    /// Category assigned to payloads posted to the generic catch-all endpoint.
    pub const UNIVERSAL: &'static str = "universal";

    /// Creates a category, normalising to trimmed lowercase.
    pub fn new(s: impl AsRef<str>) -> Self {
        Category(s.as_ref().trim().to_ascii_lowercase())
    }

    /// Returns the category name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The catch-all category.
    pub fn universal() -> Self {
        Category(Self::UNIVERSAL.to_string())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Category::new(s)
    }
}
