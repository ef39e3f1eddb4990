//! Process store abstraction
//!
//! The review service only ever reads one record and updates one record, so
//! the seam is deliberately small. Backends live in [`crate::postgrest`],
//! [`crate::postgres`] and [`crate::memory`].

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::{ProcessRow, ProcessUpdate};

/// Read/write access to workflow process records
#[async_trait]
pub trait ProcessStore: Send + Sync {
    /// Fetch the rows whose `process_id` matches
    ///
    /// Backends return at most two rows: enough for the caller to tell a
    /// single match from an ambiguous one.
    async fn fetch_process(&self, process_id: &str) -> StoreResult<Vec<ProcessRow>>;

    /// Apply an update to the record, returning the number of rows changed
    ///
    /// A guarded update (`only_if`) that finds the record in another status
    /// changes nothing and returns `Ok(0)`.
    async fn update_process(&self, process_id: &str, update: &ProcessUpdate) -> StoreResult<u64>;

    /// Check backend connectivity
    async fn health_check(&self) -> StoreResult<bool>;

    /// Short backend name used in logs
    fn backend_name(&self) -> &'static str;
}
