//! Store configuration and construction
//!
//! This module reads the backing-store settings from the environment and
//! builds the process store the service is wired with at startup.

use regex::Regex;
use std::env;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{error, info};

use crate::error::{StoreError, StoreResult};
use crate::memory::MemoryStore;
use crate::postgres::PostgresStore;
use crate::postgrest::PostgrestStore;
use crate::store::ProcessStore;

/// Table the workflow producer writes process records to
pub const DEFAULT_PROCESS_TABLE: &str = "youtube_prep";

/// Which backend holds the process records
#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    /// Hosted REST API
    Postgrest { url: String, api_key: String },
    /// Direct PostgreSQL connection
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    /// In-process store, optionally seeded from a JSON file
    Memory { seed_file: Option<PathBuf> },
}

/// Store configuration struct
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backend selection and its connection settings
    pub backend: StoreBackend,
    /// Table holding the process records
    pub table: String,
    /// Request / connection timeout
    pub timeout: Duration,
}

impl StoreConfig {
    /// Create a new StoreConfig from environment variables
    ///
    /// # Environment Variables
    /// - `STORE_BACKEND`: `postgrest`, `postgres` or `memory` (default: `postgrest`)
    /// - `SUPABASE_URL` / `SUPABASE_KEY`: project URL and API key (postgrest)
    /// - `DATABASE_URL`: PostgreSQL connection URL (postgres)
    /// - `DATABASE_MAX_CONNECTIONS`: Maximum number of connections (default: 5)
    /// - `STORE_SEED_FILE`: JSON file of process records (memory)
    /// - `PROCESS_TABLE`: Table name (default: `youtube_prep`)
    /// - `STORE_TIMEOUT_SECONDS`: Request timeout in seconds (default: 30)
    pub fn from_env() -> StoreResult<Self> {
        let backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgrest".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgrest" | "supabase" => StoreBackend::Postgrest {
                url: required("SUPABASE_URL")?,
                api_key: required("SUPABASE_KEY")?,
            },
            "postgres" => StoreBackend::Postgres {
                database_url: required("DATABASE_URL")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            },
            "memory" => StoreBackend::Memory {
                seed_file: env::var("STORE_SEED_FILE").ok().map(PathBuf::from),
            },
            other => {
                return Err(StoreError::Configuration(format!(
                    "Unknown STORE_BACKEND: {}",
                    other
                )));
            }
        };

        let table =
            env::var("PROCESS_TABLE").unwrap_or_else(|_| DEFAULT_PROCESS_TABLE.to_string());
        validate_table_name(&table)?;

        let timeout = env::var("STORE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            backend,
            table,
            timeout: Duration::from_secs(timeout),
        })
    }
}

fn required(name: &str) -> StoreResult<String> {
    env::var(name)
        .map_err(|_| StoreError::Configuration(format!("{} environment variable not set", name)))
}

/// Check that `table` is a plain, optionally schema-qualified, identifier
///
/// The name is interpolated into SQL and URLs, so nothing else is accepted.
pub fn validate_table_name(table: &str) -> StoreResult<()> {
    static TABLE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = TABLE_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
            .expect("Failed to compile table name regex")
    });

    if regex.is_match(table) {
        Ok(())
    } else {
        Err(StoreError::Configuration(format!(
            "Invalid table name: {}",
            table
        )))
    }
}

/// Build the process store described by `config`
///
/// # Returns
///
/// * `StoreResult<Arc<dyn ProcessStore>>` - Shared store handle or error
pub async fn init_store(config: &StoreConfig) -> StoreResult<Arc<dyn ProcessStore>> {
    let store: Arc<dyn ProcessStore> = match &config.backend {
        StoreBackend::Postgrest { url, api_key } => {
            info!("Using PostgREST store at {}", url);
            Arc::new(PostgrestStore::new(
                url,
                api_key,
                &config.table,
                config.timeout,
            )?)
        }
        StoreBackend::Postgres {
            database_url,
            max_connections,
        } => Arc::new(
            PostgresStore::connect(database_url, *max_connections, &config.table, config.timeout)
                .await?,
        ),
        StoreBackend::Memory { seed_file } => {
            info!("Using in-memory store");
            match seed_file {
                Some(path) => Arc::new(MemoryStore::from_seed_file(path).await?),
                None => Arc::new(MemoryStore::new()),
            }
        }
    };

    Ok(store)
}

/// Check store connectivity
///
/// # Returns
///
/// * `bool` - True if the store answered, false otherwise
pub async fn health_check(store: &dyn ProcessStore) -> bool {
    match store.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            error!("{} store health check failed: {}", store.backend_name(), e);
            false
        }
    }
}
