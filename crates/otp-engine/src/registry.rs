//! Session registry: the only state shared across tasks.

use crate::error::EngineError;
use crate::session::{Session, SessionInfo};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct Indexes {
    by_id: HashMap<String, Arc<Session>>,
    by_user: HashMap<i64, HashSet<String>>,
}

/// Owns all active sessions behind one lock. Both indices mutate under
/// a single write guard, so readers always observe a consistent pair
/// and never a half-updated insert or removal.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<Indexes>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under both indices. A number may have at
    /// most one concurrent session against it.
    pub async fn insert(&self, session: Arc<Session>) -> Result<(), EngineError> {
        let mut ix = self.inner.write().await;

        if ix
            .by_id
            .values()
            .any(|s| s.number.value == session.number.value)
        {
            return Err(EngineError::AlreadyMonitored(session.number.value.clone()));
        }

        ix.by_user
            .entry(session.owner)
            .or_default()
            .insert(session.id.clone());
        ix.by_id.insert(session.id.clone(), session);
        Ok(())
    }

    /// Remove a session from both indices. Safe to call from the
    /// poller's completion path and from cancellation concurrently:
    /// whoever loses the race gets `None`.
    pub async fn remove(&self, id: &str) -> Option<Arc<Session>> {
        let mut ix = self.inner.write().await;
        let session = ix.by_id.remove(id)?;

        if let Some(ids) = ix.by_user.get_mut(&session.owner) {
            ids.remove(id);
            if ids.is_empty() {
                ix.by_user.remove(&session.owner);
            }
        }

        debug!("Removed session {}", id);
        Some(session)
    }

    /// Set the stop flag and unregister. Cancelling a session that has
    /// already finished is a no-op.
    pub async fn cancel(&self, id: &str) -> Option<SessionInfo> {
        let session = self.remove(id).await?;
        session.request_stop();
        Some(session.info())
    }

    /// Cancel every session a user owns.
    pub async fn cancel_all_for_user(&self, user: i64) -> Vec<SessionInfo> {
        let mut ix = self.inner.write().await;

        let ids = match ix.by_user.remove(&user) {
            Some(ids) => ids,
            None => return Vec::new(),
        };

        let mut cancelled = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(session) = ix.by_id.remove(&id) {
                session.request_stop();
                cancelled.push(session.info());
            }
        }
        cancelled
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.inner.read().await.by_id.get(id).cloned()
    }

    pub async fn sessions_for_user(&self, user: i64) -> Vec<Arc<Session>> {
        let ix = self.inner.read().await;
        let Some(ids) = ix.by_user.get(&user) else {
            return Vec::new();
        };
        ids.iter().filter_map(|id| ix.by_id.get(id).cloned()).collect()
    }

    /// Whether any live session is watching `number`. Used by the
    /// sweeper to stay out of an in-flight poller's way.
    pub async fn has_active_session(&self, number: &str) -> bool {
        self.inner
            .read()
            .await
            .by_id
            .values()
            .any(|s| s.number.value == number && !s.is_stopped())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.by_id.is_empty()
    }
}
