//! Ordered, bounded file selection

use serde::Serialize;

use super::ReviewError;
use crate::models::channel::MediaFile;

/// Result of an accepted toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggled {
    Added,
    Removed,
}

/// File indices picked by the reviewer, in the order they were picked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    picked: Vec<usize>,
    limit: usize,
}

impl Selection {
    /// Create an empty selection holding at most `limit` files
    pub fn new(limit: usize) -> Self {
        Self {
            picked: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Add `index` if absent, remove it if present
    ///
    /// Adding past the limit is refused and leaves the selection untouched.
    pub fn toggle(&mut self, index: usize) -> Result<Toggled, ReviewError> {
        if let Some(position) = self.position(index) {
            self.picked.remove(position);
            return Ok(Toggled::Removed);
        }

        if self.picked.len() >= self.limit {
            return Err(ReviewError::LimitReached { limit: self.limit });
        }

        self.picked.push(index);
        Ok(Toggled::Added)
    }

    /// Selected indices in pick order
    pub fn indices(&self) -> &[usize] {
        &self.picked
    }

    /// Where `index` sits in the pick order
    pub fn position(&self, index: usize) -> Option<usize> {
        self.picked.iter().position(|picked| *picked == index)
    }

    pub fn len(&self) -> usize {
        self.picked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picked.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Comma-joined ids of the selected files in pick order
    ///
    /// Returns `None` when nothing is selected.
    pub fn user_choice(&self, files: &[MediaFile]) -> Option<String> {
        let ids: Vec<&str> = self
            .indices()
            .iter()
            .filter_map(|index| files.get(*index))
            .map(|file| file.file_id.as_str())
            .collect();

        if ids.is_empty() {
            None
        } else {
            Some(ids.join(","))
        }
    }
}
