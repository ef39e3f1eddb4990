//! Process loader: one read per visit

use common::ProcessStore;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::models::{ReviewData, channel::ChannelData};
use crate::review::{EmptyReason, LoadOutcome};

/// Fetch the record for `process_id` and decide what the reviewer sees
///
/// Issues at most one read. Store errors and malformed `channel_data` end up
/// as `Failed` with a human readable message; nothing here panics.
pub async fn load_process(store: &dyn ProcessStore, process_id: &str) -> LoadOutcome {
    if process_id.trim().is_empty() {
        return LoadOutcome::Empty(EmptyReason::NotFound);
    }

    let mut rows = match store.fetch_process(process_id).await {
        Ok(rows) => rows,
        Err(e) => {
            error!("Failed to load process {}: {}", process_id, e);
            return LoadOutcome::Failed(e.to_string());
        }
    };

    if rows.len() > 1 {
        warn!("Process id {} matches {} records", process_id, rows.len());
        return LoadOutcome::Empty(EmptyReason::Ambiguous { rows: rows.len() });
    }
    let Some(row) = rows.pop() else {
        return LoadOutcome::Empty(EmptyReason::NotFound);
    };

    if !row.status.is_actionable() {
        info!("Process {} is already {}", process_id, row.status);
        return LoadOutcome::Empty(EmptyReason::AlreadyDecided { status: row.status });
    }

    let raw = match row.channel_data {
        Some(Value::Null) | None => return LoadOutcome::Empty(EmptyReason::NoFiles),
        Some(raw) => raw,
    };

    match ChannelData::decode(&raw) {
        Ok(channel) if channel.list_of_files.is_empty() => {
            LoadOutcome::Empty(EmptyReason::NoFiles)
        }
        Ok(channel) => {
            info!(
                "Loaded process {} with {} files (select up to {})",
                process_id,
                channel.list_of_files.len(),
                channel.selection_limit()
            );
            LoadOutcome::Ready(ReviewData {
                process_id: process_id.to_string(),
                channel_id: row.channel_id,
                channel,
            })
        }
        Err(e) => {
            error!("Failed to decode channel data for {}: {}", process_id, e);
            LoadOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::channel::tests::channel_json;
    use common::{MemoryStore, ProcessRecord, ProcessStatus};

    fn record(status: ProcessStatus, channel_data: Option<Value>) -> ProcessRecord {
        ProcessRecord {
            process_id: "abc-123".to_string(),
            status,
            channel_id: "UC42".to_string(),
            channel_data,
            user_choice: None,
        }
    }

    fn serialized(value: Value) -> Option<Value> {
        Some(Value::String(value.to_string()))
    }

    #[tokio::test]
    async fn test_waiting_record_is_ready() {
        let store = MemoryStore::with_records(vec![record(
            ProcessStatus::Waiting,
            serialized(channel_json(Some(2), &["f1", "f2"])),
        )]);

        match load_process(&store, "abc-123").await {
            LoadOutcome::Ready(data) => {
                assert_eq!(data.channel_id, "UC42");
                assert_eq!(data.channel.list_of_files.len(), 2);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(store.fetch_count().await, 1);
    }

    #[tokio::test]
    async fn test_decided_record_is_empty_whatever_the_payload() {
        let store = MemoryStore::with_records(vec![record(
            ProcessStatus::Selected,
            serialized(channel_json(None, &["f1"])),
        )]);

        assert_eq!(
            load_process(&store, "abc-123").await,
            LoadOutcome::Empty(EmptyReason::AlreadyDecided {
                status: ProcessStatus::Selected
            })
        );
    }

    #[tokio::test]
    async fn test_missing_and_duplicate_records_are_empty() {
        let store = MemoryStore::new();
        assert_eq!(
            load_process(&store, "abc-123").await,
            LoadOutcome::Empty(EmptyReason::NotFound)
        );

        let data = serialized(channel_json(None, &["f1"]));
        let store = MemoryStore::with_records(vec![
            record(ProcessStatus::Waiting, data.clone()),
            record(ProcessStatus::Waiting, data),
        ]);
        assert_eq!(
            load_process(&store, "abc-123").await,
            LoadOutcome::Empty(EmptyReason::Ambiguous { rows: 2 })
        );
    }

    #[tokio::test]
    async fn test_no_files_is_empty() {
        let store = MemoryStore::with_records(vec![record(ProcessStatus::Waiting, None)]);
        assert_eq!(
            load_process(&store, "abc-123").await,
            LoadOutcome::Empty(EmptyReason::NoFiles)
        );

        let store = MemoryStore::with_records(vec![record(
            ProcessStatus::Waiting,
            serialized(channel_json(None, &[])),
        )]);
        assert_eq!(
            load_process(&store, "abc-123").await,
            LoadOutcome::Empty(EmptyReason::NoFiles)
        );
    }

    #[tokio::test]
    async fn test_malformed_channel_data_fails() {
        let store = MemoryStore::with_records(vec![record(
            ProcessStatus::Waiting,
            Some(Value::String("{\"author\": \"Ada\"".to_string())),
        )]);

        match load_process(&store, "abc-123").await {
            LoadOutcome::Failed(message) => assert!(message.starts_with("Invalid channel data")),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_store_error_message_is_kept() {
        let store = MemoryStore::new();
        store.fail_reads_with("permission denied for table youtube_prep").await;

        assert_eq!(
            load_process(&store, "abc-123").await,
            LoadOutcome::Failed("permission denied for table youtube_prep".to_string())
        );
    }

    #[tokio::test]
    async fn test_blank_process_id_skips_the_store() {
        let store = MemoryStore::new();
        assert_eq!(
            load_process(&store, "  ").await,
            LoadOutcome::Empty(EmptyReason::NotFound)
        );
        assert_eq!(store.fetch_count().await, 0);
    }
}
