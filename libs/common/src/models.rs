//! Process records as stored by the workflow backend

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Workflow status of a process record
///
/// Only `waiting`, `selected` and `rejected` matter to the review service;
/// any other state written by the producer is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProcessStatus {
    Waiting,
    Selected,
    Rejected,
    Other(String),
}

impl ProcessStatus {
    /// Get the status as it is stored in the backend
    pub fn as_str(&self) -> &str {
        match self {
            ProcessStatus::Waiting => "waiting",
            ProcessStatus::Selected => "selected",
            ProcessStatus::Rejected => "rejected",
            ProcessStatus::Other(other) => other,
        }
    }

    /// Whether a reviewer may still act on the record
    pub fn is_actionable(&self) -> bool {
        matches!(self, ProcessStatus::Waiting)
    }
}

impl From<&str> for ProcessStatus {
    fn from(value: &str) -> Self {
        match value {
            "waiting" => ProcessStatus::Waiting,
            "selected" => ProcessStatus::Selected,
            "rejected" => ProcessStatus::Rejected,
            other => ProcessStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ProcessStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProcessStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ProcessStatus::from(raw.as_str()))
    }
}

/// Full process record, as kept by the in-memory store and seed files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub process_id: String,
    pub status: ProcessStatus,
    pub channel_id: String,
    /// Either a JSON string (text column) or an inline JSON document
    pub channel_data: Option<serde_json::Value>,
    #[serde(default)]
    pub user_choice: Option<String>,
}

impl ProcessRecord {
    /// Project the columns the review page reads
    pub fn to_row(&self) -> ProcessRow {
        ProcessRow {
            status: self.status.clone(),
            channel_id: self.channel_id.clone(),
            channel_data: self.channel_data.clone(),
        }
    }
}

/// Columns read when a reviewer opens a process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRow {
    pub status: ProcessStatus,
    pub channel_id: String,
    pub channel_data: Option<serde_json::Value>,
}

/// Columns written when a reviewer decides
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessUpdate {
    pub status: ProcessStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_choice: Option<String>,
    /// Only apply the update while the record is still in this status
    #[serde(skip)]
    pub only_if: Option<ProcessStatus>,
}

impl ProcessUpdate {
    /// Create an update guarded on the record still waiting for review
    pub fn decide(status: ProcessStatus, user_choice: Option<String>) -> Self {
        Self {
            status,
            user_choice: user_choice.filter(|choice| !choice.is_empty()),
            only_if: Some(ProcessStatus::Waiting),
        }
    }

    /// Whether the guard allows the update on a record in `current` status
    pub fn applies_to(&self, current: &ProcessStatus) -> bool {
        self.only_if.as_ref().is_none_or(|expected| expected == current)
    }
}
