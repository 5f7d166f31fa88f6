//! Ingestion counters reported on the status endpoint.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::Category;

/// Counters for what happened at the ingestion boundary.
///
/// Expiry and delivery are counted by the store itself, since only the store
/// knows when a record leaves.
#[derive(Debug, Clone)]
pub struct IngestStats {
    pub received: u64,
    pub failed: u64,
    pub duplicates: u64,
    pub by_category: BTreeMap<Category, u64>,
    pub last_update: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
}

impl IngestStats {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        IngestStats {
            received: 0,
            failed: 0,
            duplicates: 0,
            by_category: BTreeMap::new(),
            last_update: None,
            started_at,
        }
    }

    pub fn record_admitted(&mut self, category: &Category, now: DateTime<Utc>) {
        self.received += 1;
        *self.by_category.entry(category.clone()).or_default() += 1;
        self.last_update = Some(now);
    }

    pub fn record_duplicate(&mut self) {
        self.duplicates += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_received: u64,
    pub total_processed: u64,
    pub total_failed: u64,
    pub total_expired: u64,
    pub total_duplicates: u64,
    pub by_category: BTreeMap<Category, u64>,
    pub last_update: Option<DateTime<Utc>>,
    pub start_time: DateTime<Utc>,
}

impl StatsSnapshot {
    pub fn new(ingest: &IngestStats, delivered: u64, expired: u64) -> Self {
        StatsSnapshot {
            total_received: ingest.received,
            total_processed: delivered,
            total_failed: ingest.failed,
            total_expired: expired,
            total_duplicates: ingest.duplicates,
            by_category: ingest.by_category.clone(),
            last_update: ingest.last_update,
            start_time: ingest.started_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admitted_counts_per_category() {
        let start = DateTime::from_timestamp_millis(0).unwrap();
        let now = DateTime::from_timestamp_millis(10).unwrap();
        let mut stats = IngestStats::new(start);

        stats.record_admitted(&Category::new("free"), now);
        stats.record_admitted(&Category::new("free"), now);
        stats.record_admitted(&Category::new("premium"), now);
        stats.record_duplicate();
        stats.record_failure();

        let snapshot = StatsSnapshot::new(&stats, 1, 2);
        assert_eq!(snapshot.total_received, 3);
        assert_eq!(snapshot.by_category[&Category::new("free")], 2);
        assert_eq!(snapshot.by_category[&Category::new("premium")], 1);
        assert_eq!(snapshot.total_duplicates, 1);
        assert_eq!(snapshot.total_failed, 1);
        assert_eq!(snapshot.total_processed, 1);
        assert_eq!(snapshot.total_expired, 2);
        assert_eq!(snapshot.last_update, Some(now));
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let stats = IngestStats::new(DateTime::from_timestamp_millis(0).unwrap());
        let json = serde_json::to_value(StatsSnapshot::new(&stats, 0, 0)).unwrap();
        assert_eq!(json["totalReceived"], 0);
        assert!(json["lastUpdate"].is_null());
        assert!(json.get("startTime").is_some());
    }
}
