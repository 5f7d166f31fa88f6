//! The job store and its dequeue policy.
//!
//! Records are held in insertion order. Ordering for delivery is computed on
//! demand:
//! 1. Category rank (highest priority first)
//! 2. `received_at` (oldest first)
//! 3. Insertion sequence (FIFO when timestamps tie)
//!
//! # Record lifecycle
//!
//! ```text
//! Pending --take_next--> Delivered
//!    |
//!    +----evict_expired--> Expired
//! ```
//!
//! Both exits remove the record, so eviction is idempotent: whichever trigger
//! runs first removes it and counts it once.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::types::JobRecord;

use super::priority::CategoryRanking;

/// Default record time-to-live (4 seconds).
pub const DEFAULT_TTL_MS: u64 = 4_000;

#[derive(Debug, Clone)]
struct StoredJob {
    record: JobRecord,
    sequence: u64,
}

/// An ordered collection of live job records with per-record expiry.
#[derive(Debug)]
pub struct JobStore {
    entries: Vec<StoredJob>,
    ttl: TimeDelta,
    ranking: CategoryRanking,

    /// Counter for FIFO tie-breaking. Never reset.
    next_sequence: u64,

    expired: u64,
    delivered: u64,
}

impl JobStore {
    /// Creates an empty store.
    pub fn new(ttl: Duration, ranking: CategoryRanking) -> Self {
        JobStore {
            entries: Vec::new(),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            ranking,
            next_sequence: 0,
            expired: 0,
            delivered: 0,
        }
    }

    /// Number of records currently held, including any not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total records removed by expiry.
    pub fn expired_count(&self) -> u64 {
        self.expired
    }

    /// Total records handed out by [`JobStore::take_next`].
    pub fn delivered_count(&self) -> u64 {
        self.delivered
    }

    /// Returns true if the record's age has reached the TTL.
    pub fn is_expired(&self, record: &JobRecord, now: DateTime<Utc>) -> bool {
        record.age(now) >= self.ttl
    }

    /// Time left before the record expires, floored at zero.
    pub fn expires_in(&self, record: &JobRecord, now: DateTime<Utc>) -> TimeDelta {
        (self.ttl - record.age(now)).max(TimeDelta::zero())
    }

    /// Adds a record.
    pub fn insert(&mut self, record: JobRecord) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.push(StoredJob { record, sequence });
    }

    /// Removes every record whose age meets or exceeds the TTL.
    ///
    /// Returns the number of records removed.
    pub fn evict_expired(&mut self, now: DateTime<Utc>) -> usize {
        let (expired, live): (Vec<StoredJob>, Vec<StoredJob>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| self.is_expired(&entry.record, now));
        self.entries = live;
        self.expired += expired.len() as u64;
        expired.len()
    }

    /// Evicts expired records, then removes and returns the best remaining one.
    ///
    /// Returns `None` when nothing live is left; that is the normal
    /// "nothing ready yet" answer, not an error.
    pub fn take_next(&mut self, now: DateTime<Utc>) -> Option<JobRecord> {
        self.evict_expired(now);

        let index = self
            .entries
            .iter()
            .enumerate()
            .min_by_key(|(_, entry)| self.priority_key(entry))
            .map(|(index, _)| index)?;

        self.delivered += 1;
        Some(self.entries.remove(index).record)
    }

    /// Returns the held records in delivery order without removing them.
    ///
    /// Does not evict; callers wanting a view free of expired records should
    /// call [`JobStore::evict_expired`] first.
    pub fn peek_all(&self) -> Vec<&JobRecord> {
        let mut ordered: Vec<&StoredJob> = self.entries.iter().collect();
        ordered.sort_by_key(|entry| self.priority_key(entry));
        ordered.into_iter().map(|entry| &entry.record).collect()
    }

    /// Records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &JobRecord> {
        self.entries.iter().map(|entry| &entry.record)
    }

    fn priority_key(&self, entry: &StoredJob) -> (usize, DateTime<Utc>, u64) {
        (
            self.ranking.rank(&entry.record.category),
            entry.record.received_at(),
            entry.sequence,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, JobId};
    use proptest::prelude::*;

    const TTL_MS: u64 = 15_000;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn store() -> JobStore {
        JobStore::new(Duration::from_millis(TTL_MS), CategoryRanking::default())
    }

    fn job(name: &str, category: &str, received_ms: i64) -> JobRecord {
        JobRecord::new(
            None,
            name,
            "0",
            "0/0",
            Category::new(category),
            at(received_ms),
        )
    }

    fn scenario_record() -> JobRecord {
        JobRecord::new(
            Some(JobId::new("a-b-c")),
            "X",
            "5K/s",
            "3/10",
            Category::new("free"),
            at(0),
        )
    }

    #[test]
    fn expired_record_is_not_returned() {
        let mut store = store();
        store.insert(scenario_record());

        assert_eq!(store.take_next(at(16_000)), None);
        assert_eq!(store.expired_count(), 1);
        assert_eq!(store.delivered_count(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn live_record_is_returned_once() {
        let mut store = store();
        store.insert(scenario_record());

        let taken = store.take_next(at(5_000)).unwrap();
        assert_eq!(taken, scenario_record());
        assert_eq!(store.take_next(at(5_000)), None);
        assert_eq!(store.delivered_count(), 1);
        assert_eq!(store.expired_count(), 0);
    }

    #[test]
    fn age_equal_to_ttl_is_expired() {
        let mut store = store();
        store.insert(job("A", "free", 0));
        assert_eq!(store.take_next(at(TTL_MS as i64)), None);
    }

    #[test]
    fn age_just_under_ttl_is_live() {
        let mut store = store();
        store.insert(job("A", "free", 0));
        assert!(store.take_next(at(TTL_MS as i64 - 1)).is_some());
    }

    #[test]
    fn evict_is_idempotent() {
        let mut store = store();
        store.insert(job("A", "free", 0));
        store.insert(job("B", "free", 10_000));

        assert_eq!(store.evict_expired(at(20_000)), 1);
        assert_eq!(store.evict_expired(at(20_000)), 0);
        assert_eq!(store.expired_count(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn highest_category_first_regardless_of_insertion() {
        let mut store = store();
        store.insert(job("free", "free", 0));
        store.insert(job("basic", "basic", 1));
        store.insert(job("highlight", "highlight", 2));
        store.insert(job("essential", "essential", 3));
        store.insert(job("premium", "premium", 4));

        let order: Vec<String> = std::iter::from_fn(|| store.take_next(at(100)))
            .map(|r| r.name)
            .collect();
        assert_eq!(order, ["premium", "essential", "highlight", "basic", "free"]);
    }

    #[test]
    fn oldest_first_within_category() {
        let mut store = store();
        store.insert(job("newer", "free", 200));
        store.insert(job("older", "free", 100));

        assert_eq!(store.take_next(at(300)).unwrap().name, "older");
        assert_eq!(store.take_next(at(300)).unwrap().name, "newer");
    }

    #[test]
    fn insertion_order_breaks_timestamp_ties() {
        let mut store = store();
        store.insert(job("first", "free", 100));
        store.insert(job("second", "free", 100));

        assert_eq!(store.take_next(at(300)).unwrap().name, "first");
    }

    #[test]
    fn unranked_categories_come_last() {
        let mut store = store();
        store.insert(job("universal", "universal", 0));
        store.insert(job("free", "free", 50));

        assert_eq!(store.take_next(at(100)).unwrap().name, "free");
        assert_eq!(store.take_next(at(100)).unwrap().name, "universal");
    }

    #[test]
    fn peek_all_is_ordered_and_non_destructive() {
        let mut store = store();
        store.insert(job("free", "free", 0));
        store.insert(job("premium", "premium", 1));

        let names: Vec<&str> = store.peek_all().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["premium", "free"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn expires_in_floors_at_zero() {
        let store = store();
        let record = job("A", "free", 0);
        assert_eq!(store.expires_in(&record, at(5_000)), TimeDelta::milliseconds(10_000));
        assert_eq!(store.expires_in(&record, at(99_000)), TimeDelta::zero());
    }

    fn arb_category() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("premium"),
            Just("essential"),
            Just("highlight"),
            Just("basic"),
            Just("free"),
            Just("universal"),
        ]
    }

    proptest! {
        /// Nothing is ever delivered at or past its TTL.
        #[test]
        fn never_returns_expired(
            inserts in prop::collection::vec((arb_category(), 0i64..30_000), 1..20),
            pulls in prop::collection::vec(0i64..60_000, 1..20),
        ) {
            let mut store = store();
            for (i, (category, received)) in inserts.iter().enumerate() {
                store.insert(job(&i.to_string(), category, *received));
            }
            let mut pulls = pulls;
            pulls.sort();
            for now in pulls {
                if let Some(record) = store.take_next(at(now)) {
                    prop_assert!(record.age(at(now)) < TimeDelta::milliseconds(TTL_MS as i64));
                }
            }
        }

        /// Each record leaves the store exactly once.
        #[test]
        fn never_delivers_twice(
            inserts in prop::collection::vec(arb_category(), 1..30),
        ) {
            let mut store = store();
            for (i, category) in inserts.iter().enumerate() {
                store.insert(job(&i.to_string(), category, i as i64));
            }
            let mut seen = std::collections::HashSet::new();
            while let Some(record) = store.take_next(at(1_000)) {
                prop_assert!(seen.insert(record.name));
            }
            prop_assert_eq!(seen.len(), inserts.len());
            prop_assert_eq!(store.delivered_count() + store.expired_count(), inserts.len() as u64);
        }

        /// Delivery order is non-decreasing in (rank, received_at).
        #[test]
        fn delivery_respects_priority(
            inserts in prop::collection::vec((arb_category(), 0i64..1_000), 1..30),
        ) {
            let mut store = store();
            for (i, (category, received)) in inserts.iter().enumerate() {
                store.insert(job(&i.to_string(), category, *received));
            }
            let ranking = CategoryRanking::default();
            let keys: Vec<(usize, DateTime<Utc>)> = std::iter::from_fn(|| store.take_next(at(2_000)))
                .map(|r| (ranking.rank(&r.category), r.received_at()))
                .collect();
            prop_assert!(keys.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
