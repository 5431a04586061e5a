//! Lease engine: ties pool, source, notifier and registry together.

use crate::alert::AuthAlert;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::extract::OtpExtractor;
use crate::notify::Notifier;
use crate::poller::{self, PollerCtx};
use crate::registry::SessionRegistry;
use crate::session::{DeliveryTarget, Session, SessionInfo};
use crate::source::SmsSource;
use crate::sweeper::Sweeper;
use number_pool::{Number, NumberPool};
use std::sync::Arc;
use tracing::info;

/// Orchestrates number leases: claims from the pool, registers
/// sessions, spawns one poller per session and the background sweeper.
pub struct LeaseEngine {
    pool: Arc<dyn NumberPool>,
    source: Arc<dyn SmsSource>,
    notifier: Arc<dyn Notifier>,
    extractor: Arc<OtpExtractor>,
    registry: SessionRegistry,
    alert: Arc<AuthAlert>,
    config: EngineConfig,
}

impl LeaseEngine {
    pub fn new(
        pool: Arc<dyn NumberPool>,
        source: Arc<dyn SmsSource>,
        notifier: Arc<dyn Notifier>,
        extractor: OtpExtractor,
        config: EngineConfig,
    ) -> Self {
        let alert = Arc::new(AuthAlert::new(
            config.alert.cooldown,
            config.admins.clone(),
        ));
        Self {
            pool,
            source,
            notifier,
            extractor: Arc::new(extractor),
            registry: SessionRegistry::new(),
            alert,
            config,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Claim an available number for a country under an exclusive
    /// lease.
    pub async fn claim(&self, country_code: &str) -> Option<Number> {
        self.pool.claim_random(country_code).await
    }

    /// Return a claimed number without ever having watched it (e.g.
    /// when posting the status message failed).
    pub async fn unclaim(&self, value: &str) -> bool {
        self.pool.release(value).await
    }

    /// Register a session for an already-claimed number and spawn its
    /// poller.
    pub async fn start_session(
        &self,
        number: Number,
        owner: i64,
        target: DeliveryTarget,
    ) -> Result<Arc<Session>, EngineError> {
        let session = Arc::new(Session::new(number, owner, target));
        self.registry.insert(session.clone()).await?;

        info!(
            "Started session {} for user {} on {}",
            session.id, owner, session.number.value
        );
        tokio::spawn(poller::run(self.poller_ctx(), session.clone()));
        Ok(session)
    }

    /// Cancel one session and release its number back to the pool.
    pub async fn cancel_session(&self, id: &str) -> Option<SessionInfo> {
        let info = self.registry.cancel(id).await?;
        self.pool.release(&info.number.value).await;
        Some(info)
    }

    /// Cancel every session a user owns, releasing each number.
    pub async fn cancel_all_for_user(&self, user: i64) -> Vec<SessionInfo> {
        let infos = self.registry.cancel_all_for_user(user).await;
        for info in &infos {
            self.pool.release(&info.number.value).await;
        }
        infos
    }

    /// Spawn the background sweeper, if enabled.
    pub fn spawn_sweeper(&self) -> Option<tokio::task::JoinHandle<()>> {
        if !self.config.sweep.enabled {
            info!("Sweeper disabled by configuration");
            return None;
        }

        let sweeper = Sweeper::new(
            self.pool.clone(),
            self.source.clone(),
            self.notifier.clone(),
            self.extractor.clone(),
            self.registry.clone(),
            self.alert.clone(),
            self.config.sweep.clone(),
            self.config.admins.clone(),
        );
        Some(sweeper.spawn())
    }

    fn poller_ctx(&self) -> PollerCtx {
        PollerCtx {
            source: self.source.clone(),
            notifier: self.notifier.clone(),
            pool: self.pool.clone(),
            extractor: self.extractor.clone(),
            registry: self.registry.clone(),
            alert: self.alert.clone(),
            poll_interval: self.config.poll_interval,
            session_timeout: self.config.session_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{RecordingNotifier, ScriptedSource};
    use number_pool::MemoryPool;
    use std::time::Duration;

    async fn engine() -> (LeaseEngine, Arc<MemoryPool>) {
        let pool = Arc::new(MemoryPool::new());
        pool.insert(Number::new("59171234567", "591")).await;

        let config = EngineConfig {
            poll_interval: Duration::from_millis(10),
            session_timeout: Duration::from_secs(10),
            ..EngineConfig::default()
        };
        let engine = LeaseEngine::new(
            pool.clone(),
            Arc::new(ScriptedSource::default()),
            Arc::new(RecordingNotifier::default()),
            OtpExtractor::default(),
            config,
        );
        (engine, pool)
    }

    fn target() -> DeliveryTarget {
        DeliveryTarget {
            chat_id: 7,
            message_id: 1,
        }
    }

    #[tokio::test]
    async fn cancel_session_releases_the_number() {
        let (engine, _pool) = engine().await;

        let number = engine.claim("591").await.unwrap();
        let session = engine.start_session(number, 7, target()).await.unwrap();
        assert!(engine.claim("591").await.is_none());

        engine.cancel_session(&session.id).await.unwrap();

        assert!(engine.registry().is_empty().await);
        assert!(engine.claim("591").await.is_some());
    }

    #[tokio::test]
    async fn cancel_all_for_user_releases_every_number() {
        let (engine, pool) = engine().await;
        pool.insert(Number::new("59179999999", "591")).await;

        let n1 = engine.claim("591").await.unwrap();
        let n2 = engine.claim("591").await.unwrap();
        engine.start_session(n1, 7, target()).await.unwrap();
        engine.start_session(n2, 7, target()).await.unwrap();

        let cancelled = engine.cancel_all_for_user(7).await;

        assert_eq!(cancelled.len(), 2);
        assert_eq!(pool.available_count("591").await, 2);
    }

    #[tokio::test]
    async fn double_start_on_one_number_is_rejected() {
        let (engine, _pool) = engine().await;

        let number = engine.claim("591").await.unwrap();
        engine
            .start_session(number.clone(), 7, target())
            .await
            .unwrap();

        let err = engine.start_session(number, 8, target()).await.unwrap_err();
        assert!(matches!(err, EngineError::AlreadyMonitored(_)));
    }

    #[tokio::test]
    async fn unclaim_returns_a_never_watched_number() {
        let (engine, pool) = engine().await;

        let number = engine.claim("591").await.unwrap();
        assert!(engine.unclaim(&number.value).await);
        assert_eq!(pool.available_count("591").await, 1);
    }
}
