//! Review state machine
//!
//! One `ReviewState` per page visit. Every change of what the reviewer sees
//! goes through the transitions below; a transition that does not apply to
//! the current state is refused and leaves the state untouched.
//!
//! ```text
//! Loading ─settle─▶ Failed | Empty | Ready
//! Ready ─begin─▶ Submitting ─finish─▶ Done | Ready | Empty
//! ```

use common::{ProcessStatus, ProcessUpdate};
use serde::Serialize;
use thiserror::Error;

use crate::models::ReviewData;
use crate::writer::WriteOutcome;

pub mod selection;

pub use selection::{Selection, Toggled};

/// Reasons a transition was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("Please select at least one file first.")]
    EmptySelection,

    #[error("You can select at most {limit} file(s).")]
    LimitReached { limit: usize },

    #[error("There is no file at position {index} (only {len} files).")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("A decision is already being submitted.")]
    Busy,

    #[error("This process can no longer be reviewed.")]
    NotActionable,
}

/// Why there is nothing to review
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmptyReason {
    /// No record carries this process id
    NotFound,
    /// The record has already left the waiting state
    AlreadyDecided { status: ProcessStatus },
    /// Several records carry this process id
    Ambiguous { rows: usize },
    /// The record is waiting but has no files attached
    NoFiles,
    /// Another session decided while this one was submitting
    DecidedElsewhere,
}

impl EmptyReason {
    /// Text shown to the reviewer
    pub fn message(&self) -> String {
        match self {
            EmptyReason::NotFound => "No review is pending for this link.".to_string(),
            EmptyReason::AlreadyDecided { status } => {
                format!("Already solved: this process is {}.", status)
            }
            EmptyReason::Ambiguous { rows } => format!(
                "No data to display: {} records share this process id.",
                rows
            ),
            EmptyReason::NoFiles => "No data to display: there are no files to review.".to_string(),
            EmptyReason::DecidedElsewhere => {
                "Already solved: a decision was recorded from another session.".to_string()
            }
        }
    }
}

/// What the reviewer asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Submit,
    Reject,
}

impl ReviewAction {
    /// Status written back when the action succeeds
    pub fn target_status(self) -> ProcessStatus {
        match self {
            ReviewAction::Submit => ProcessStatus::Selected,
            ReviewAction::Reject => ProcessStatus::Rejected,
        }
    }

    /// Label shown while the write is in flight
    pub fn in_flight_label(self) -> &'static str {
        match self {
            ReviewAction::Submit => "Submitting...",
            ReviewAction::Reject => "Rejecting...",
        }
    }
}

/// The write a reviewer action produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub status: ProcessStatus,
    pub user_choice: Option<String>,
}

impl Decision {
    /// Store update for this decision, guarded on the record still waiting
    pub fn to_update(&self) -> ProcessUpdate {
        ProcessUpdate::decide(self.status.clone(), self.user_choice.clone())
    }
}

/// Result of loading a process
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Ready(ReviewData),
    Empty(EmptyReason),
    Failed(String),
}

/// What the reviewer currently sees
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReviewState {
    Loading,
    Failed {
        message: String,
    },
    Empty {
        reason: EmptyReason,
    },
    Ready {
        data: ReviewData,
        selection: Selection,
    },
    Submitting {
        data: ReviewData,
        selection: Selection,
        action: ReviewAction,
    },
    Done {
        data: ReviewData,
        status: ProcessStatus,
    },
}

impl ReviewState {
    fn take(&mut self) -> ReviewState {
        std::mem::replace(self, ReviewState::Loading)
    }

    fn refusal(&self) -> ReviewError {
        match self {
            ReviewState::Submitting { .. } => ReviewError::Busy,
            _ => ReviewError::NotActionable,
        }
    }

    /// Apply the loader result; only valid while loading
    pub fn settle(&mut self, outcome: LoadOutcome) -> Result<(), ReviewError> {
        if !matches!(self, ReviewState::Loading) {
            return Err(self.refusal());
        }

        *self = match outcome {
            LoadOutcome::Ready(data) => {
                let selection = Selection::new(data.channel.selection_limit());
                ReviewState::Ready { data, selection }
            }
            LoadOutcome::Empty(reason) => ReviewState::Empty { reason },
            LoadOutcome::Failed(message) => ReviewState::Failed { message },
        };
        Ok(())
    }

    /// Toggle the file at `index`; only valid while ready
    pub fn toggle(&mut self, index: usize) -> Result<Toggled, ReviewError> {
        match self {
            ReviewState::Ready { data, selection } => {
                let len = data.channel.list_of_files.len();
                if index >= len {
                    return Err(ReviewError::IndexOutOfRange { index, len });
                }
                selection.toggle(index)
            }
            other => Err(other.refusal()),
        }
    }

    /// Start a decision and move to `Submitting`
    ///
    /// Submitting needs a selection; rejecting ignores it and never carries a
    /// choice.
    pub fn begin(&mut self, action: ReviewAction) -> Result<Decision, ReviewError> {
        let (data, selection) = match self.take() {
            ReviewState::Ready { data, selection } => (data, selection),
            other => {
                let err = other.refusal();
                *self = other;
                return Err(err);
            }
        };

        let user_choice = match action {
            ReviewAction::Submit => match selection.user_choice(&data.channel.list_of_files) {
                Some(choice) => Some(choice),
                None => {
                    *self = ReviewState::Ready { data, selection };
                    return Err(ReviewError::EmptySelection);
                }
            },
            ReviewAction::Reject => None,
        };

        *self = ReviewState::Submitting {
            data,
            selection,
            action,
        };
        Ok(Decision {
            status: action.target_status(),
            user_choice,
        })
    }

    /// Apply the write result; only valid while submitting
    pub fn finish(&mut self, outcome: &WriteOutcome) -> Result<(), ReviewError> {
        let (data, selection, action) = match self.take() {
            ReviewState::Submitting {
                data,
                selection,
                action,
            } => (data, selection, action),
            other => {
                *self = other;
                return Err(ReviewError::NotActionable);
            }
        };

        *self = match outcome {
            WriteOutcome::Written => ReviewState::Done {
                data,
                status: action.target_status(),
            },
            WriteOutcome::Failed(_) => ReviewState::Ready { data, selection },
            WriteOutcome::Conflict => ReviewState::Empty {
                reason: EmptyReason::DecidedElsewhere,
            },
        };
        Ok(())
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ReviewState::Loading => "loading",
            ReviewState::Failed { .. } => "failed",
            ReviewState::Empty { .. } => "empty",
            ReviewState::Ready { .. } => "ready",
            ReviewState::Submitting { .. } => "submitting",
            ReviewState::Done { .. } => "done",
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::channel::{ChannelData, tests::channel_json};

    pub(crate) fn review_data(to_select: Option<u32>, file_ids: &[&str]) -> ReviewData {
        ReviewData {
            process_id: "abc-123".to_string(),
            channel_id: "UC42".to_string(),
            channel: ChannelData::decode(&channel_json(to_select, file_ids)).unwrap(),
        }
    }

    fn ready(to_select: Option<u32>, file_ids: &[&str]) -> ReviewState {
        let mut state = ReviewState::Loading;
        state
            .settle(LoadOutcome::Ready(review_data(to_select, file_ids)))
            .unwrap();
        state
    }

    #[test]
    fn test_settle_only_from_loading() {
        let mut state = ReviewState::Loading;
        state
            .settle(LoadOutcome::Failed("boom".to_string()))
            .unwrap();
        assert_eq!(
            state,
            ReviewState::Failed {
                message: "boom".to_string()
            }
        );
        assert_eq!(
            state.settle(LoadOutcome::Empty(EmptyReason::NotFound)),
            Err(ReviewError::NotActionable)
        );
    }

    #[test]
    fn test_single_select_submit_sends_file_id() {
        let mut state = ready(Some(1), &["f1", "f2"]);
        assert_eq!(state.toggle(1), Ok(Toggled::Added));

        let decision = state.begin(ReviewAction::Submit).unwrap();
        assert_eq!(
            decision,
            Decision {
                status: ProcessStatus::Selected,
                user_choice: Some("f2".to_string()),
            }
        );
        assert_eq!(state.name(), "submitting");
    }

    #[test]
    fn test_third_click_rejected_with_limit_two() {
        let mut state = ready(Some(2), &["f1", "f2", "f3"]);
        state.toggle(0).unwrap();
        state.toggle(1).unwrap();
        assert_eq!(state.toggle(2), Err(ReviewError::LimitReached { limit: 2 }));

        let decision = state.begin(ReviewAction::Submit).unwrap();
        assert_eq!(decision.user_choice.as_deref(), Some("f1,f2"));
    }

    #[test]
    fn test_user_choice_uses_selection_order_not_render_order() {
        let mut state = ready(Some(3), &["f1", "f2", "f3"]);
        state.toggle(2).unwrap();
        state.toggle(0).unwrap();

        let decision = state.begin(ReviewAction::Submit).unwrap();
        assert_eq!(decision.user_choice.as_deref(), Some("f3,f1"));
    }

    #[test]
    fn test_submit_without_selection_is_refused() {
        let mut state = ready(None, &["f1"]);
        let before = state.clone();
        assert_eq!(
            state.begin(ReviewAction::Submit),
            Err(ReviewError::EmptySelection)
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_reject_never_carries_a_choice() {
        let mut state = ready(Some(2), &["f1", "f2"]);
        state.toggle(0).unwrap();

        let decision = state.begin(ReviewAction::Reject).unwrap();
        assert_eq!(decision.status, ProcessStatus::Rejected);
        assert_eq!(decision.user_choice, None);
        assert_eq!(decision.to_update().user_choice, None);
    }

    #[test]
    fn test_out_of_range_index_is_refused() {
        let mut state = ready(None, &["f1"]);
        assert_eq!(
            state.toggle(4),
            Err(ReviewError::IndexOutOfRange { index: 4, len: 1 })
        );
    }

    #[test]
    fn test_submitting_is_busy() {
        let mut state = ready(None, &["f1"]);
        state.toggle(0).unwrap();
        state.begin(ReviewAction::Submit).unwrap();

        assert_eq!(state.toggle(0), Err(ReviewError::Busy));
        assert_eq!(state.begin(ReviewAction::Reject), Err(ReviewError::Busy));
        assert_eq!(state.settle(LoadOutcome::Failed("late".to_string())), Err(ReviewError::Busy));
    }

    #[test]
    fn test_write_failure_returns_to_ready_with_selection() {
        let mut state = ready(Some(2), &["f1", "f2"]);
        state.toggle(1).unwrap();
        state.begin(ReviewAction::Submit).unwrap();

        state
            .finish(&WriteOutcome::Failed("timeout".to_string()))
            .unwrap();
        match &state {
            ReviewState::Ready { selection, .. } => assert_eq!(selection.indices(), &[1]),
            other => panic!("unexpected state {:?}", other),
        }

        // the reviewer may retry with the other action
        let decision = state.begin(ReviewAction::Reject).unwrap();
        assert_eq!(decision.status, ProcessStatus::Rejected);
    }

    #[test]
    fn test_finish_written_and_conflict() {
        let mut state = ready(None, &["f1"]);
        state.begin(ReviewAction::Reject).unwrap();
        state.finish(&WriteOutcome::Written).unwrap();
        assert!(matches!(
            state,
            ReviewState::Done { status: ProcessStatus::Rejected, .. }
        ));
        assert_eq!(state.finish(&WriteOutcome::Written), Err(ReviewError::NotActionable));

        let mut state = ready(None, &["f1"]);
        state.toggle(0).unwrap();
        state.begin(ReviewAction::Submit).unwrap();
        state.finish(&WriteOutcome::Conflict).unwrap();
        assert_eq!(
            state,
            ReviewState::Empty {
                reason: EmptyReason::DecidedElsewhere
            }
        );
    }

    #[test]
    fn test_state_serializes_with_tag() {
        let state = ReviewState::Empty {
            reason: EmptyReason::AlreadyDecided {
                status: ProcessStatus::Selected,
            },
        };
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            serde_json::json!({
                "state": "empty",
                "reason": { "kind": "already_decided", "status": "selected" }
            })
        );
    }
}
