//! Decision writer: one guarded update per reviewer action

use common::ProcessStore;
use tracing::{error, info, warn};

use crate::review::Decision;

/// Result of writing a decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The record now carries the decision
    Written,
    /// The record was no longer waiting; nothing changed
    Conflict,
    /// The store refused or could not be reached
    Failed(String),
}

/// Write `decision` to the record for `process_id`
///
/// The update only applies while the record is still `waiting`, so two
/// reviewers on the same link cannot both win.
pub async fn write_decision(
    store: &dyn ProcessStore,
    process_id: &str,
    decision: &Decision,
) -> WriteOutcome {
    let update = decision.to_update();

    match store.update_process(process_id, &update).await {
        Ok(0) => {
            warn!(
                "Process {} was no longer waiting, {} not written",
                process_id, decision.status
            );
            WriteOutcome::Conflict
        }
        Ok(_) => {
            info!(
                "Process {} {} (choice: {})",
                process_id,
                decision.status,
                decision.user_choice.as_deref().unwrap_or("none")
            );
            WriteOutcome::Written
        }
        Err(e) => {
            error!("Failed to write decision for {}: {}", process_id, e);
            WriteOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{MemoryStore, ProcessRecord, ProcessStatus, ProcessUpdate};

    fn store_with(status: ProcessStatus) -> MemoryStore {
        MemoryStore::with_records(vec![ProcessRecord {
            process_id: "abc-123".to_string(),
            status,
            channel_id: "UC42".to_string(),
            channel_data: None,
            user_choice: None,
        }])
    }

    #[tokio::test]
    async fn test_selection_is_written_with_choice() {
        let store = store_with(ProcessStatus::Waiting);
        let decision = Decision {
            status: ProcessStatus::Selected,
            user_choice: Some("f1,f2".to_string()),
        };

        assert_eq!(
            write_decision(&store, "abc-123", &decision).await,
            WriteOutcome::Written
        );

        let updates = store.updates().await;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "abc-123");
        assert_eq!(
            updates[0].1,
            ProcessUpdate::decide(ProcessStatus::Selected, Some("f1,f2".to_string()))
        );

        let record = store.record("abc-123").await.unwrap();
        assert_eq!(record.status, ProcessStatus::Selected);
        assert_eq!(record.user_choice.as_deref(), Some("f1,f2"));
    }

    #[tokio::test]
    async fn test_decided_record_conflicts() {
        let store = store_with(ProcessStatus::Rejected);
        let decision = Decision {
            status: ProcessStatus::Selected,
            user_choice: Some("f1".to_string()),
        };

        assert_eq!(
            write_decision(&store, "abc-123", &decision).await,
            WriteOutcome::Conflict
        );
        assert_eq!(
            store.record("abc-123").await.unwrap().status,
            ProcessStatus::Rejected
        );
    }

    #[tokio::test]
    async fn test_store_failure_is_reported_verbatim() {
        let store = store_with(ProcessStatus::Waiting);
        store.fail_next_update_with("new row violates row-level security policy").await;
        let decision = Decision {
            status: ProcessStatus::Rejected,
            user_choice: None,
        };

        assert_eq!(
            write_decision(&store, "abc-123", &decision).await,
            WriteOutcome::Failed("new row violates row-level security policy".to_string())
        );
    }
}
