// src/store/mod.rs

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::process::RawTable;

/// One uploaded file, as parsed at ingestion time.
#[derive(Debug)]
pub struct Dataset {
    pub id: String,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub table: RawTable,
}

/// What callers get back after ingesting or listing datasets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub file_id: String,
    pub file_name: String,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl Dataset {
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            file_id: self.id.clone(),
            file_name: self.file_name.clone(),
            row_count: self.table.row_count(),
            columns: self.table.headers.clone(),
            uploaded_at: self.uploaded_at,
        }
    }
}

/// In-memory cache of uploaded datasets, keyed by a generated identifier.
///
/// Owned by the service and shared with handlers behind an `Arc`. Readers
/// clone the `Arc<Dataset>` out and never hold the lock while computing.
/// Without a TTL nothing is ever evicted, so memory grows with every upload.
pub struct DatasetStore {
    datasets: RwLock<HashMap<String, Arc<Dataset>>>,
    next_seq: AtomicU64,
    ttl: Option<Duration>,
}

impl DatasetStore {
    /// Unbounded store.
    pub fn new() -> Self {
        Self::with_ttl(None)
    }

    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            datasets: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            ttl,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Cache `table` under a fresh identifier and return its summary.
    pub async fn insert(&self, file_name: &str, table: RawTable) -> DatasetSummary {
        let uploaded_at = Utc::now();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let id = format!("{}-{}", uploaded_at.timestamp_micros(), seq);

        let dataset = Arc::new(Dataset {
            id: id.clone(),
            file_name: file_name.to_string(),
            uploaded_at,
            table,
        });
        let summary = dataset.summary();

        self.datasets.write().await.insert(id, dataset);
        info!(
            file_id = %summary.file_id,
            rows = summary.row_count,
            "cached dataset"
        );
        summary
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Dataset>> {
        self.datasets.read().await.get(id).cloned()
    }

    /// Summaries of all cached datasets, oldest first.
    pub async fn list(&self) -> Vec<DatasetSummary> {
        let mut out: Vec<DatasetSummary> = self
            .datasets
            .read()
            .await
            .values()
            .map(|d| d.summary())
            .collect();
        out.sort_by(|a, b| {
            a.uploaded_at
                .cmp(&b.uploaded_at)
                .then_with(|| a.file_id.cmp(&b.file_id))
        });
        out
    }

    pub async fn len(&self) -> usize {
        self.datasets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every dataset uploaded more than the TTL before `now`.
    /// Returns how many were evicted; always 0 without a TTL.
    pub async fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let cutoff = now - ttl;

        let mut guard = self.datasets.write().await;
        let before = guard.len();
        guard.retain(|_, d| d.uploaded_at >= cutoff);
        let evicted = before - guard.len();
        if evicted > 0 {
            debug!(evicted, remaining = guard.len(), "evicted expired datasets");
        }
        evicted
    }
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodically evict expired datasets. Runs until the task is dropped.
pub async fn eviction_task(store: Arc<DatasetStore>, every: std::time::Duration) {
    info!("starting dataset eviction (interval: {:?})", every);
    let mut timer = tokio::time::interval(every);
    loop {
        timer.tick().await;
        let evicted = store.evict_expired(Utc::now()).await;
        if evicted > 0 {
            info!(evicted, "evicted expired datasets");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: usize) -> RawTable {
        RawTable {
            headers: vec!["date".into(), "a".into()],
            rows: (0..rows)
                .map(|i| vec![format!("2024-01-{:02}", i + 1), i.to_string()])
                .collect(),
        }
    }

    #[tokio::test]
    async fn insert_then_get() {
        let store = DatasetStore::new();
        let summary = store.insert("sales.csv", table(3)).await;
        assert_eq!(summary.row_count, 3);
        assert_eq!(summary.columns, vec!["date", "a"]);

        let ds = store.get(&summary.file_id).await.unwrap();
        assert_eq!(ds.file_name, "sales.csv");
        assert_eq!(ds.table.row_count(), 3);
        assert!(store.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn identifiers_are_unique() {
        let store = DatasetStore::new();
        let a = store.insert("a.csv", table(1)).await;
        let b = store.insert("b.csv", table(1)).await;
        assert_ne!(a.file_id, b.file_id);
        assert_eq!(store.len().await, 2);

        let listed: Vec<_> = store.list().await.into_iter().map(|s| s.file_id).collect();
        assert_eq!(listed, vec![a.file_id, b.file_id]);
    }

    #[tokio::test]
    async fn ttl_eviction() {
        let store = DatasetStore::with_ttl(Some(Duration::seconds(60)));
        let summary = store.insert("a.csv", table(1)).await;

        assert_eq!(store.evict_expired(Utc::now()).await, 0);
        assert!(store.get(&summary.file_id).await.is_some());

        let later = Utc::now() + Duration::seconds(120);
        assert_eq!(store.evict_expired(later).await, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn no_ttl_never_evicts() {
        let store = DatasetStore::new();
        store.insert("a.csv", table(1)).await;
        let far_future = Utc::now() + Duration::days(365);
        assert_eq!(store.evict_expired(far_future).await, 0);
        assert_eq!(store.len().await, 1);
    }
}
