//! Process store backed by a hosted PostgREST API (Supabase style)
//!
//! Reads and writes go through `/rest/v1/{table}` with the project API key
//! sent both as `apikey` and as a bearer token.

use async_trait::async_trait;
use reqwest::{
    Client, Response, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

use crate::error::{StoreError, StoreResult};
use crate::models::{ProcessRow, ProcessUpdate};
use crate::store::ProcessStore;

/// Columns the review page needs
const ROW_COLUMNS: &str = "status,channel_id,channel_data";

/// Error payload returned by PostgREST
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    message: Option<String>,
    details: Option<String>,
}

/// PostgREST-backed process store
#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    base_url: String,
    table: String,
}

impl PostgrestStore {
    /// Create a new store client
    ///
    /// # Arguments
    ///
    /// * `base_url` - Project URL, e.g. `https://xyz.supabase.co`
    /// * `api_key` - Project API key
    /// * `table` - Table holding the process records
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: &str, api_key: &str, table: &str, timeout: Duration) -> StoreResult<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| StoreError::Configuration(format!("Invalid API key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| StoreError::Configuration(format!("Invalid API key: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(StoreError::Connection)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            table: table.to_string(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn fetch_query(process_id: &str) -> Vec<(&'static str, String)> {
        vec![
            ("select", ROW_COLUMNS.to_string()),
            ("process_id", format!("eq.{}", process_id)),
            ("limit", "2".to_string()),
        ]
    }

    fn update_query(process_id: &str, update: &ProcessUpdate) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("process_id", format!("eq.{}", process_id)),
            ("select", "process_id".to_string()),
        ];
        if let Some(expected) = &update.only_if {
            query.push(("status", format!("eq.{}", expected)));
        }
        query
    }

    async fn backend_error(response: Response) -> StoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        StoreError::Backend {
            status: status.as_u16(),
            message: backend_message(status, &body),
        }
    }
}

/// Extract the human readable part of a PostgREST error body
fn backend_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<PostgrestErrorBody>(body) {
        Ok(PostgrestErrorBody {
            message: Some(message),
            ..
        }) => message,
        Ok(PostgrestErrorBody {
            details: Some(details),
            ..
        }) => details,
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => status
            .canonical_reason()
            .unwrap_or("Unknown store error")
            .to_string(),
    }
}

#[async_trait]
impl ProcessStore for PostgrestStore {
    async fn fetch_process(&self, process_id: &str) -> StoreResult<Vec<ProcessRow>> {
        debug!("Fetching process {} from {}", process_id, self.table);

        let response = self
            .client
            .get(self.table_url())
            .query(&Self::fetch_query(process_id))
            .send()
            .await
            .map_err(StoreError::Connection)?;

        if !response.status().is_success() {
            let err = Self::backend_error(response).await;
            error!("Failed to fetch process {}: {}", process_id, err);
            return Err(err);
        }

        response
            .json::<Vec<ProcessRow>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn update_process(&self, process_id: &str, update: &ProcessUpdate) -> StoreResult<u64> {
        debug!("Updating process {} to {}", process_id, update.status);

        let response = self
            .client
            .patch(self.table_url())
            .query(&Self::update_query(process_id, update))
            .header("Prefer", "return=representation")
            .json(update)
            .send()
            .await
            .map_err(StoreError::Connection)?;

        if !response.status().is_success() {
            let err = Self::backend_error(response).await;
            error!("Failed to update process {}: {}", process_id, err);
            return Err(err);
        }

        let changed = response
            .json::<Vec<serde_json::Value>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(changed.len() as u64)
    }

    async fn health_check(&self) -> StoreResult<bool> {
        let response = self
            .client
            .get(self.table_url())
            .query(&[("select", "process_id"), ("limit", "1")])
            .send()
            .await
            .map_err(StoreError::Connection)?;

        Ok(response.status().is_success())
    }

    fn backend_name(&self) -> &'static str {
        "postgrest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProcessStatus;

    fn store() -> PostgrestStore {
        PostgrestStore::new(
            "https://project.supabase.co/",
            "anon-key",
            "youtube_prep",
            Duration::from_secs(5),
        )
        .expect("Failed to build store")
    }

    #[test]
    fn test_table_url_strips_trailing_slash() {
        assert_eq!(
            store().table_url(),
            "https://project.supabase.co/rest/v1/youtube_prep"
        );
    }

    #[test]
    fn test_fetch_query_filters_on_process_id() {
        let query = PostgrestStore::fetch_query("abc-123");
        assert_eq!(
            query,
            vec![
                ("select", "status,channel_id,channel_data".to_string()),
                ("process_id", "eq.abc-123".to_string()),
                ("limit", "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_update_query_carries_status_guard() {
        let update = ProcessUpdate::decide(ProcessStatus::Selected, Some("f2".to_string()));
        let query = PostgrestStore::update_query("abc-123", &update);
        assert!(query.contains(&("status", "eq.waiting".to_string())));
        assert!(query.contains(&("process_id", "eq.abc-123".to_string())));
    }

    #[test]
    fn test_invalid_api_key_is_a_configuration_error() {
        let result = PostgrestStore::new(
            "https://project.supabase.co",
            "bad\nkey",
            "youtube_prep",
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(StoreError::Configuration(_))));
    }

    #[test]
    fn test_backend_message_prefers_message_field() {
        let body = r#"{"code":"42P01","details":null,"hint":null,"message":"relation \"public.youtube_prep\" does not exist"}"#;
        assert_eq!(
            backend_message(StatusCode::NOT_FOUND, body),
            "relation \"public.youtube_prep\" does not exist"
        );
    }

    #[test]
    fn test_backend_message_falls_back_to_body_then_reason() {
        assert_eq!(
            backend_message(StatusCode::BAD_GATEWAY, "upstream down"),
            "upstream down"
        );
        assert_eq!(
            backend_message(StatusCode::SERVICE_UNAVAILABLE, ""),
            "Service Unavailable"
        );
    }
}
