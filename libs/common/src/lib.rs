//! Common library for the review services
//!
//! This crate provides the process store used by the review service: the
//! record models, the store trait and its PostgREST, PostgreSQL and in-memory
//! backends, plus configuration and error handling for them.

pub mod database;
pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod postgrest;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use models::{ProcessRecord, ProcessRow, ProcessStatus, ProcessUpdate};
pub use store::ProcessStore;

/// Example usage of the store module
///
/// ```rust,no_run
/// use common::database::{StoreConfig, init_store, health_check};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = StoreConfig::from_env()?;
///     let store = init_store(&config).await?;
///     println!("Store health check: {}", health_check(store.as_ref()).await);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
