//! The relay: one owned job store shared by ingestion, delivery and the sweeper.
//!
//! Every operation takes the store lock once and runs its check-and-mutate
//! sequence to completion under it, so a pull can never observe a record
//! between its expiry check and its removal, and the sweeper and a pull can
//! never both remove the same record.
//!
//! Extraction runs before the lock is taken; it is pure and touches no shared
//! state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::extract::{ExtractionFailure, extract_job};
use crate::queue::{CategoryRanking, DedupePolicy, IngestStats, JobStore, StatsSnapshot};
use crate::types::{Category, JobCandidate, JobId, JobRecord};

/// Queue behaviour supplied by configuration.
#[derive(Debug, Clone)]
pub struct QueueSettings {
    /// Maximum age at which a record is still deliverable.
    pub ttl: Duration,
    pub dedupe: DedupePolicy,
    pub ranking: CategoryRanking,
}

/// What happened to an inbound payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new record was added to the store.
    Admitted(JobRecord),
    /// The payload resent a job that is still queued. Not an error.
    DuplicateDropped(JobCandidate),
    /// No embed carried enough signal.
    ExtractionFailed(ExtractionFailure),
}

/// Handle to the shared job store.
///
/// Cheap to clone; all clones share the same store.
#[derive(Clone)]
pub struct JobRelay {
    inner: Arc<RelayInner>,
}

struct RelayInner {
    dedupe: DedupePolicy,
    state: Mutex<RelayState>,
}

struct RelayState {
    store: JobStore,
    stats: IngestStats,
    /// Latest admission stamp. New records never get an earlier one.
    last_received_at: Option<DateTime<Utc>>,
}

impl JobRelay {
    /// Creates a relay with an empty store.
    pub fn new(settings: QueueSettings, started_at: DateTime<Utc>) -> Self {
        JobRelay {
            inner: Arc::new(RelayInner {
                dedupe: settings.dedupe,
                state: Mutex::new(RelayState {
                    store: JobStore::new(settings.ttl, settings.ranking),
                    stats: IngestStats::new(started_at),
                    last_received_at: None,
                }),
            }),
        }
    }

    /// Extracts a job from a payload and admits it under `category`.
    pub fn ingest(&self, category: Category, body: &Value, now: DateTime<Utc>) -> IngestOutcome {
        match extract_job(body) {
            Ok(candidate) => self.admit(candidate, category, now),
            Err(failure) => {
                self.record_failure();
                warn!(category = %category, reason = %failure, "Payload yielded no job");
                IngestOutcome::ExtractionFailed(failure)
            }
        }
    }

    /// Deduplicates a candidate against the live records and inserts it.
    ///
    /// Expired records are evicted first so they never suppress a resend.
    /// The admission stamp is `now`, raised to the previous stamp if the
    /// clock has stepped back.
    pub fn admit(
        &self,
        candidate: JobCandidate,
        category: Category,
        now: DateTime<Utc>,
    ) -> IngestOutcome {
        let mut state = self.lock();
        state.store.evict_expired(now);

        if self
            .inner
            .dedupe
            .is_duplicate(&candidate, &category, state.store.records(), now)
        {
            state.stats.record_duplicate();
            debug!(
                category = %category,
                job_id = candidate.job_id.as_ref().map(JobId::as_str),
                name = %candidate.name,
                "Duplicate job ignored"
            );
            return IngestOutcome::DuplicateDropped(candidate);
        }

        let received_at = state.last_received_at.map_or(now, |last| last.max(now));
        state.last_received_at = Some(received_at);

        let record = candidate.into_record(category, received_at);
        state.stats.record_admitted(&record.category, received_at);
        state.store.insert(record.clone());

        info!(
            category = %record.category,
            job_id = record.job_id.as_ref().map(JobId::as_str),
            name = %record.name,
            value = %record.value,
            players = %record.players,
            queue_size = state.store.len(),
            "Job queued"
        );
        IngestOutcome::Admitted(record)
    }

    /// Counts a payload that could not be read at all.
    pub fn record_failure(&self) {
        self.lock().stats.record_failure();
    }

    /// Removes and returns the best live record, if any.
    pub fn pull(&self, now: DateTime<Utc>) -> Option<JobRecord> {
        let mut state = self.lock();
        let record = state.store.take_next(now)?;
        info!(
            category = %record.category,
            job_id = record.job_id.as_ref().map(JobId::as_str),
            name = %record.name,
            value = %record.value,
            "Job delivered"
        );
        Some(record)
    }

    /// Evicts expired records. Returns how many were removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        self.lock().store.evict_expired(now)
    }

    /// Number of records currently held.
    pub fn queue_len(&self) -> usize {
        self.lock().store.len()
    }

    /// Evicts expired records, then reports counters and the queue in
    /// delivery order.
    pub fn snapshot(&self, now: DateTime<Utc>) -> RelaySnapshot {
        let mut state = self.lock();
        state.store.evict_expired(now);

        let store = &state.store;
        let queue: Vec<QueuedJobView> = store
            .peek_all()
            .into_iter()
            .map(|record| QueuedJobView {
                job_id: record.job_id.clone(),
                name: record.name.clone(),
                value: record.value.clone(),
                players: record.players.clone(),
                category: record.category.clone(),
                received_at: record.received_at(),
                expires_in_ms: store.expires_in(record, now).num_milliseconds(),
            })
            .collect();

        RelaySnapshot {
            stats: StatsSnapshot::new(&state.stats, store.delivered_count(), store.expired_count()),
            queue_size: queue.len(),
            queue,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RelayState> {
        // A panic while holding the lock cannot leave the store half-updated:
        // every mutation is a single Vec operation followed by counter bumps.
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for JobRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRelay")
            .field("dedupe", &self.inner.dedupe)
            .finish_non_exhaustive()
    }
}

/// A queued record as shown on the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedJobView {
    pub job_id: Option<JobId>,
    pub name: String,
    pub value: String,
    pub players: String,
    pub category: Category,
    pub received_at: DateTime<Utc>,
    pub expires_in_ms: i64,
}

/// Counters plus the live queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelaySnapshot {
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    pub queue_size: usize,
    pub queue: Vec<QueuedJobView>,
}
