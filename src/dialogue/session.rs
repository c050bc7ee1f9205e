//! Dialogue sessions and the session store
//!
//! A session is a value. A turn produces the next value and the caller
//! swaps it into the store; a turn that never completes leaves the stored
//! session untouched.

use super::state::DialogueState;
use crate::analysis::EngineSituation;
use crate::error::{DialogueError, Result};
use crate::resolver::Event;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub state: DialogueState,
    pub situation: EngineSituation,
    /// Event emitted by each completed turn
    #[serde(default)]
    pub history: Vec<Event>,
}

impl DialogueSession {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            state: DialogueState::default(),
            situation: EngineSituation::default(),
            history: Vec::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Next session value after a turn that emitted `event`
    pub fn advance(&self, event: Event, situation: EngineSituation) -> Self {
        let mut next = self.clone();
        next.state = self.state.next(event);
        next.situation = situation;
        next.history.push(event);
        next.updated_at = Utc::now();
        next
    }
}

impl Default for DialogueSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Sessions by id, shared between request handlers
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, DialogueSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a fresh session
    pub async fn create(&self) -> DialogueSession {
        let session = DialogueSession::new();
        self.sessions.write().await.insert(session.id, session.clone());
        tracing::info!(session_id = %session.id, "Session created");
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<DialogueSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Swap in the result of a completed turn
    pub async fn replace(&self, session: DialogueSession) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session.id) {
            Some(slot) => {
                *slot = session;
                Ok(())
            }
            None => Err(DialogueError::SessionNotFound(session.id)),
        }
    }

    pub async fn remove(&self, id: Uuid) -> Option<DialogueSession> {
        let removed = self.sessions.write().await.remove(&id);
        if removed.is_some() {
            tracing::info!(session_id = %id, "Session removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_keeps_original() {
        let session = DialogueSession::new();
        let next = session.advance(Event::InvalidInput, EngineSituation::default());
        assert_eq!(session.state, DialogueState::DeterminingIntent);
        assert!(session.history.is_empty());
        assert_eq!(next.state, DialogueState::SelectingCube);
        assert_eq!(next.history, vec![Event::InvalidInput]);
        assert_eq!(next.id, session.id);
    }

    #[tokio::test]
    async fn test_store_lifecycle() {
        let store = SessionStore::new();
        let session = store.create().await;
        assert_eq!(store.len().await, 1);

        let next = session.advance(Event::Exit, EngineSituation::default());
        store.replace(next).await.unwrap();
        assert!(store.get(session.id).await.unwrap().is_finished());

        assert!(store.remove(session.id).await.is_some());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_replace_unknown_session_fails() {
        let store = SessionStore::new();
        let err = store.replace(DialogueSession::new()).await.unwrap_err();
        assert!(matches!(err, DialogueError::SessionNotFound(_)));
    }
}
