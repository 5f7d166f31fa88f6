//! Duplicate suppression for freshly extracted jobs.
//!
//! Producers resend the same server under the same job id. A candidate is a
//! duplicate when the store *currently* holds a record for the same server that
//! was admitted within the duplicate window. Once that record has been evicted
//! or delivered, a resend is admitted again even if it is still nominally
//! inside the window.
//!
//! Candidates without a job id cannot be matched by id. What happens to them is
//! a policy choice ([`AnonymousDedupe`]).

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use crate::types::{Category, JobCandidate, JobRecord};

/// Default duplicate window (5 minutes).
pub const DEFAULT_DUPLICATE_WINDOW_SECS: u64 = 300;

/// How candidates without a job id are deduplicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnonymousDedupe {
    /// Always admitted.
    #[default]
    Admit,
    /// Duplicate if a live record has the same name and category.
    NameAndCategory,
}

/// Error parsing an [`AnonymousDedupe`] policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown anonymous dedupe policy {0:?} (expected \"admit\" or \"name-and-category\")")]
pub struct UnknownDedupePolicy(pub String);

impl FromStr for AnonymousDedupe {
    type Err = UnknownDedupePolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admit" => Ok(AnonymousDedupe::Admit),
            "name-and-category" | "name_and_category" => Ok(AnonymousDedupe::NameAndCategory),
            other => Err(UnknownDedupePolicy(other.to_string())),
        }
    }
}

/// Duplicate suppression settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupePolicy {
    /// How long after admission a record suppresses resends of the same job.
    pub window: Duration,
    /// Treatment of candidates without a job id.
    pub anonymous: AnonymousDedupe,
}

impl Default for DedupePolicy {
    fn default() -> Self {
        DedupePolicy {
            window: Duration::from_secs(DEFAULT_DUPLICATE_WINDOW_SECS),
            anonymous: AnonymousDedupe::default(),
        }
    }
}

impl DedupePolicy {
    /// Checks a candidate against the live records.
    ///
    /// Returns `true` if the candidate should be dropped.
    pub fn is_duplicate<'a>(
        &self,
        candidate: &JobCandidate,
        category: &Category,
        live: impl IntoIterator<Item = &'a JobRecord>,
        now: DateTime<Utc>,
    ) -> bool {
        let window = TimeDelta::from_std(self.window).unwrap_or(TimeDelta::MAX);
        let within_window = |record: &JobRecord| record.age(now) < window;

        match (&candidate.job_id, self.anonymous) {
            (Some(job_id), _) => live.into_iter().any(|record| {
                record
                    .job_id
                    .as_ref()
                    .is_some_and(|existing| existing.same_server(job_id))
                    && within_window(record)
            }),
            (None, AnonymousDedupe::Admit) => false,
            (None, AnonymousDedupe::NameAndCategory) => live.into_iter().any(|record| {
                record.job_id.is_none()
                    && record.name == candidate.name
                    && &record.category == category
                    && within_window(record)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobId;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn candidate(job_id: Option<&str>, name: &str) -> JobCandidate {
        JobCandidate {
            job_id: job_id.map(JobId::new),
            name: name.to_string(),
            ..JobCandidate::default()
        }
    }

    fn record(job_id: Option<&str>, name: &str, category: &str, received_ms: i64) -> JobRecord {
        candidate(job_id, name).into_record(Category::new(category), at(received_ms))
    }

    fn policy(window_ms: u64, anonymous: AnonymousDedupe) -> DedupePolicy {
        DedupePolicy {
            window: Duration::from_millis(window_ms),
            anonymous,
        }
    }

    #[test]
    fn same_id_within_window_is_duplicate() {
        let live = vec![record(Some("id-1"), "A", "free", 0)];
        let p = policy(300_000, AnonymousDedupe::Admit);
        assert!(p.is_duplicate(&candidate(Some("id-1"), "A"), &Category::new("free"), &live, at(1_000)));
    }

    #[test]
    fn same_id_ignores_case() {
        let live = vec![record(Some("abc-def"), "A", "free", 0)];
        let p = policy(300_000, AnonymousDedupe::Admit);
        assert!(p.is_duplicate(&candidate(Some("ABC-DEF"), "A"), &Category::new("free"), &live, at(1)));
    }

    #[test]
    fn same_id_across_categories_is_duplicate() {
        let live = vec![record(Some("id-1"), "A", "premium", 0)];
        let p = policy(300_000, AnonymousDedupe::Admit);
        assert!(p.is_duplicate(&candidate(Some("id-1"), "A"), &Category::new("free"), &live, at(1)));
    }

    #[test]
    fn same_id_outside_window_is_admitted() {
        let live = vec![record(Some("id-1"), "A", "free", 0)];
        let p = policy(1_000, AnonymousDedupe::Admit);
        assert!(!p.is_duplicate(&candidate(Some("id-1"), "A"), &Category::new("free"), &live, at(1_000)));
    }

    #[test]
    fn id_not_in_store_is_admitted() {
        let p = policy(300_000, AnonymousDedupe::Admit);
        let live: Vec<JobRecord> = vec![record(Some("other"), "A", "free", 0)];
        assert!(!p.is_duplicate(&candidate(Some("id-1"), "A"), &Category::new("free"), &live, at(1)));
        assert!(!p.is_duplicate(&candidate(Some("id-1"), "A"), &Category::new("free"), &[], at(1)));
    }

    #[test]
    fn anonymous_admitted_by_default() {
        let live = vec![record(None, "A", "highlight", 0)];
        let p = policy(300_000, AnonymousDedupe::Admit);
        assert!(!p.is_duplicate(&candidate(None, "A"), &Category::new("highlight"), &live, at(1)));
    }

    #[test]
    fn anonymous_name_and_category() {
        let live = vec![record(None, "A", "highlight", 0)];
        let p = policy(300_000, AnonymousDedupe::NameAndCategory);
        assert!(p.is_duplicate(&candidate(None, "A"), &Category::new("highlight"), &live, at(1)));
        assert!(!p.is_duplicate(&candidate(None, "A"), &Category::new("free"), &live, at(1)));
        assert!(!p.is_duplicate(&candidate(None, "B"), &Category::new("highlight"), &live, at(1)));
    }

    #[test]
    fn parse_policy() {
        assert_eq!("admit".parse(), Ok(AnonymousDedupe::Admit));
        assert_eq!(" Name-And-Category ".parse(), Ok(AnonymousDedupe::NameAndCategory));
        assert!("sometimes".parse::<AnonymousDedupe>().is_err());
    }
}
