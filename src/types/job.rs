//! Job records and the candidates they are built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{Category, JobId};

/// Name used when no usable label could be extracted.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Value used when no magnitude could be extracted.
pub const ZERO_VALUE: &str = "0";

/// Occupancy used when no `<current>/<max>` pair could be extracted.
pub const UNKNOWN_PLAYERS: &str = "0/0";

/// The parsed part of a job: everything the extractor can learn from a payload.
///
/// Every field degrades to a sentinel rather than failing, so a candidate always
/// exists; whether it is worth keeping is decided by [`JobCandidate::has_signal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCandidate {
    pub job_id: Option<JobId>,
    pub name: String,
    pub value: String,
    pub players: String,
}

impl Default for JobCandidate {
    fn default() -> Self {
        JobCandidate {
            job_id: None,
            name: UNKNOWN_NAME.to_string(),
            value: ZERO_VALUE.to_string(),
            players: UNKNOWN_PLAYERS.to_string(),
        }
    }
}

impl JobCandidate {
    /// Returns true if at least one field carries real information.
    ///
    /// Acceptance is a disjunction: an id, a resolved name, or a resolved value
    /// is each enough on its own.
    pub fn has_signal(&self) -> bool {
        self.job_id.is_some() || self.name != UNKNOWN_NAME || self.value != ZERO_VALUE
    }

    /// Stamps the candidate with its ingestion channel and arrival time.
    pub fn into_record(self, category: Category, received_at: DateTime<Utc>) -> JobRecord {
        JobRecord {
            job_id: self.job_id,
            name: self.name,
            value: self.value,
            players: self.players,
            category,
            received_at,
        }
    }
}

/// A time-bounded offer describing a joinable server instance.
///
/// `received_at` is fixed at construction; it anchors expiry and breaks ties
/// between records of the same category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: Option<JobId>,
    pub name: String,
    pub value: String,
    pub players: String,
    pub category: Category,
    received_at: DateTime<Utc>,
}

impl JobRecord {
    /// Creates a record directly, bypassing extraction.
    pub fn new(
        job_id: Option<JobId>,
        name: impl Into<String>,
        value: impl Into<String>,
        players: impl Into<String>,
        category: Category,
        received_at: DateTime<Utc>,
    ) -> Self {
        JobRecord {
            job_id,
            name: name.into(),
            value: value.into(),
            players: players.into(),
            category,
            received_at,
        }
    }

    /// When the record was admitted.
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Age of the record at `now`. Negative if `now` precedes admission.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.received_at
    }

    /// Splits `players` into its current and maximum halves.
    ///
    /// A value without a `/` yields the whole string as current and an empty max.
    pub fn player_counts(&self) -> (&str, &str) {
        self.players.split_once('/').unwrap_or((&self.players, ""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    #[test]
    fn default_candidate_has_no_signal() {
        assert!(!JobCandidate::default().has_signal());
    }

    #[test]
    fn any_single_field_is_enough_signal() {
        let with_id = JobCandidate {
            job_id: Some(JobId::new("x")),
            ..JobCandidate::default()
        };
        let with_name = JobCandidate {
            name: "Giant Banana".to_string(),
            ..JobCandidate::default()
        };
        let with_value = JobCandidate {
            value: "5K/s".to_string(),
            ..JobCandidate::default()
        };
        assert!(with_id.has_signal());
        assert!(with_name.has_signal());
        assert!(with_value.has_signal());
    }

    #[test]
    fn into_record_keeps_fields_and_stamps() {
        let candidate = JobCandidate {
            job_id: Some(JobId::new("a-b-c")),
            name: "X".to_string(),
            value: "5K/s".to_string(),
            players: "3/10".to_string(),
        };
        let record = candidate.into_record(Category::new("free"), at(1_000));
        assert_eq!(record.name, "X");
        assert_eq!(record.category.as_str(), "free");
        assert_eq!(record.received_at(), at(1_000));
        assert_eq!(record.age(at(5_000)), chrono::Duration::milliseconds(4_000));
    }

    #[test]
    fn player_counts_split_on_slash() {
        let record = JobRecord::new(None, "X", "0", "3/10", Category::new("free"), at(0));
        assert_eq!(record.player_counts(), ("3", "10"));

        let odd = JobRecord::new(None, "X", "0", "full", Category::new("free"), at(0));
        assert_eq!(odd.player_counts(), ("full", ""));
    }
}
