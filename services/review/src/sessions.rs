//! Review sessions: one state machine per page visit
//!
//! Sessions live in memory and expire after an idle TTL. The registry lock is
//! only held for synchronous transitions, never across a store call.

use chrono::{DateTime, Utc};
use common::ProcessStore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::loader::load_process;
use crate::review::{ReviewAction, ReviewError, ReviewState, Toggled};
use crate::writer::{WriteOutcome, write_decision};

/// Session lookup and transition errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Unknown, expired, or opened for another process
    #[error("Review session not found")]
    NotFound,

    #[error(transparent)]
    Review(#[from] ReviewError),
}

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient message shown once on the next render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// One page visit
#[derive(Debug, Clone)]
struct ReviewSession {
    process_id: String,
    state: ReviewState,
    notices: Vec<Notice>,
    last_seen: DateTime<Utc>,
}

impl ReviewSession {
    fn touch(&mut self) {
        self.last_seen = Utc::now();
    }
}

/// What a render needs from a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub process_id: String,
    pub state: ReviewState,
    pub notices: Vec<Notice>,
}

/// In-memory registry of review sessions
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    /// Idle time after which a session is evicted
    ttl: chrono::Duration,
    sessions: Arc<Mutex<HashMap<Uuid, ReviewSession>>>,
}

impl SessionRegistry {
    /// Create a new registry
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Open a session for `process_id` and run the loader once
    pub async fn open(&self, store: &dyn ProcessStore, process_id: &str) -> Uuid {
        let session_id = Uuid::new_v4();
        self.sessions.lock().await.insert(
            session_id,
            ReviewSession {
                process_id: process_id.to_string(),
                state: ReviewState::Loading,
                notices: Vec::new(),
                last_seen: Utc::now(),
            },
        );

        let outcome = load_process(store, process_id).await;

        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(&session_id) {
            if let Err(e) = session.state.settle(outcome) {
                warn!("Session {} could not settle: {}", session_id, e);
            }
            info!(
                "Opened session {} for process {} ({})",
                session_id,
                process_id,
                session.state.name()
            );
        }

        session_id
    }

    /// Current view of a session, consuming its pending notices
    pub async fn render(&self, session_id: Uuid, process_id: &str) -> Result<SessionView, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = Self::lookup(&mut sessions, session_id, process_id)?;
        session.touch();

        Ok(SessionView {
            session_id,
            process_id: session.process_id.clone(),
            state: session.state.clone(),
            notices: std::mem::take(&mut session.notices),
        })
    }

    /// Current state of a session, leaving its notices in place
    pub async fn state(&self, session_id: Uuid, process_id: &str) -> Result<ReviewState, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = Self::lookup(&mut sessions, session_id, process_id)?;
        Ok(session.state.clone())
    }

    /// Toggle a file; refusals are queued as notices
    pub async fn toggle(
        &self,
        session_id: Uuid,
        process_id: &str,
        index: usize,
    ) -> Result<Toggled, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = Self::lookup(&mut sessions, session_id, process_id)?;
        session.touch();

        session.state.toggle(index).map_err(|e| {
            warn!("Session {} toggle {} refused: {}", session_id, index, e);
            session.notices.push(Notice::error(e.to_string()));
            SessionError::Review(e)
        })
    }

    /// Submit or reject; performs at most one store write
    pub async fn decide(
        &self,
        store: &dyn ProcessStore,
        session_id: Uuid,
        process_id: &str,
        action: ReviewAction,
    ) -> Result<WriteOutcome, SessionError> {
        let decision = {
            let mut sessions = self.sessions.lock().await;
            let session = Self::lookup(&mut sessions, session_id, process_id)?;
            session.touch();

            session.state.begin(action).map_err(|e| {
                warn!("Session {} {:?} refused: {}", session_id, action, e);
                session.notices.push(Notice::error(e.to_string()));
                SessionError::Review(e)
            })?
        };

        let outcome = write_decision(store, process_id, &decision).await;

        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(&session_id) {
            session.state.finish(&outcome)?;
            session.notices.push(match &outcome {
                WriteOutcome::Written => {
                    Notice::info(format!("Process {} successfully!", decision.status))
                }
                WriteOutcome::Conflict => {
                    Notice::error("This process was already decided in another session.")
                }
                WriteOutcome::Failed(message) => {
                    Notice::error(format!("Error updating status: {}", message))
                }
            });
        }

        Ok(outcome)
    }

    /// Drop sessions idle for longer than the TTL
    ///
    /// Sessions with a write in flight are kept.
    pub async fn sweep(&self) -> usize {
        let Some(cutoff) = Utc::now().checked_sub_signed(self.ttl) else {
            return 0;
        };
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| {
            session.last_seen > cutoff || matches!(session.state, ReviewState::Submitting { .. })
        });
        before - sessions.len()
    }

    /// Periodically sweep expired sessions in the background
    pub fn spawn_sweeper(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let evicted = registry.sweep().await;
                if evicted > 0 {
                    info!("Evicted {} expired review sessions", evicted);
                }
            }
        })
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn lookup<'a>(
        sessions: &'a mut HashMap<Uuid, ReviewSession>,
        session_id: Uuid,
        process_id: &str,
    ) -> Result<&'a mut ReviewSession, SessionError> {
        sessions
            .get_mut(&session_id)
            .filter(|session| session.process_id == process_id)
            .ok_or(SessionError::NotFound)
    }
}
