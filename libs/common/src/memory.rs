//! In-process store for local runs and tests
//!
//! Records every fetch and update it receives and can be told to fail, which
//! makes it the fake backend for the review service tests.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::models::{ProcessRecord, ProcessRow, ProcessUpdate};
use crate::store::ProcessStore;

#[derive(Debug, Default)]
struct MemoryInner {
    records: Vec<ProcessRecord>,
    updates: Vec<(String, ProcessUpdate)>,
    fetches: usize,
    read_failure: Option<String>,
    update_failure: Option<String>,
}

/// In-memory process store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `records`
    ///
    /// Duplicate process ids are kept as separate rows.
    pub fn with_records(records: Vec<ProcessRecord>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryInner {
                records,
                ..MemoryInner::default()
            })),
        }
    }

    /// Load records from a JSON array file
    pub async fn from_seed_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await.map_err(|e| {
            StoreError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let records: Vec<ProcessRecord> = serde_json::from_slice(&data).map_err(|e| {
            StoreError::Configuration(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        info!("Seeded memory store with {} records", records.len());
        Ok(Self::with_records(records))
    }

    /// Add a record
    pub async fn insert(&self, record: ProcessRecord) {
        self.inner.lock().await.records.push(record);
    }

    /// Current state of the first record with `process_id`
    pub async fn record(&self, process_id: &str) -> Option<ProcessRecord> {
        let inner = self.inner.lock().await;
        inner
            .records
            .iter()
            .find(|record| record.process_id == process_id)
            .cloned()
    }

    /// Every update received so far, in order
    pub async fn updates(&self) -> Vec<(String, ProcessUpdate)> {
        self.inner.lock().await.updates.clone()
    }

    /// Number of fetches received so far
    pub async fn fetch_count(&self) -> usize {
        self.inner.lock().await.fetches
    }

    /// Make every following fetch fail with `message`
    pub async fn fail_reads_with(&self, message: impl Into<String>) {
        self.inner.lock().await.read_failure = Some(message.into());
    }

    /// Make the next update fail with `message`
    pub async fn fail_next_update_with(&self, message: impl Into<String>) {
        self.inner.lock().await.update_failure = Some(message.into());
    }
}

#[async_trait]
impl ProcessStore for MemoryStore {
    async fn fetch_process(&self, process_id: &str) -> StoreResult<Vec<ProcessRow>> {
        let mut inner = self.inner.lock().await;
        inner.fetches += 1;

        if let Some(message) = &inner.read_failure {
            return Err(StoreError::Backend {
                status: 500,
                message: message.clone(),
            });
        }

        Ok(inner
            .records
            .iter()
            .filter(|record| record.process_id == process_id)
            .take(2)
            .map(ProcessRecord::to_row)
            .collect())
    }

    async fn update_process(&self, process_id: &str, update: &ProcessUpdate) -> StoreResult<u64> {
        let mut inner = self.inner.lock().await;
        inner
            .updates
            .push((process_id.to_string(), update.clone()));

        if let Some(message) = inner.update_failure.take() {
            return Err(StoreError::Backend {
                status: 500,
                message,
            });
        }

        let mut changed = 0;
        for record in inner
            .records
            .iter_mut()
            .filter(|record| record.process_id == process_id)
        {
            if !update.applies_to(&record.status) {
                continue;
            }
            record.status = update.status.clone();
            if let Some(choice) = &update.user_choice {
                record.user_choice = Some(choice.clone());
            }
            changed += 1;
        }

        Ok(changed)
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
