pub mod roster;

use std::{future::Future, sync::Arc};

use dashmap::DashMap;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::AuthConfig,
    config::AppConfig,
    dao::{models::MatchEntity, roster_store::RosterStore},
    error::ServiceError,
};

pub use self::roster::{InvitationDecision, MATCH_CAPACITY, Roster, RosterError};

pub type SharedState = Arc<AppState>;

/// Central application state holding the store handle and the per-match write locks.
pub struct AppState {
    roster_store: RwLock<Option<Arc<dyn RosterStore>>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
    auth: AuthConfig,
    match_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig, auth: AuthConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            roster_store: RwLock::new(None),
            degraded: degraded_tx,
            config,
            auth,
            match_locks: DashMap::new(),
        })
    }

    /// Obtain a handle to the current roster store, if one is installed.
    pub async fn roster_store(&self) -> Option<Arc<dyn RosterStore>> {
        let guard = self.roster_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current roster store, or [`ServiceError::Degraded`] while none is installed.
    pub async fn require_store(&self) -> Result<Arc<dyn RosterStore>, ServiceError> {
        self.roster_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new roster store implementation and leave degraded mode.
    pub async fn install_roster_store(&self, store: Arc<dyn RosterStore>) {
        {
            let mut guard = self.roster_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current roster store and enter degraded mode.
    pub async fn clear_roster_store(&self) {
        {
            let mut guard = self.roster_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.roster_store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    /// Wall clock used for roster timestamps and "match is past" decisions.
    pub fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    /// Whether the match has already ended, reading its wall clock in the configured zone.
    pub fn match_is_past(&self, entity: &MatchEntity) -> bool {
        entity.is_past(self.now(), self.config.match_time_zone())
    }

    /// Broadcast the degraded flag when the value changes.
    fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Run `work` while holding the write lock of `match_id`.
    ///
    /// Roster mutations of one match never interleave inside this process. Only the wait for
    /// the lock is bounded by the configured operation timeout; once acquired, `work` runs to
    /// completion so a multi-step write is never cut in half.
    pub async fn run_exclusive<F, Fut, T>(&self, match_id: Uuid, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let lock = self
            .match_locks
            .entry(match_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let limit = self.config.operation_timeout();

        let outcome = match timeout(limit, lock.lock()).await {
            Ok(_gate) => work().await,
            Err(_) => {
                warn!(match_id = %match_id, timeout = ?limit, "gave up waiting for the match lock");
                Err(ServiceError::Timeout)
            }
        };

        drop(lock);
        self.forget_match(match_id);
        outcome
    }

    /// Drop the lock entry of `match_id` unless another operation still holds or awaits it.
    fn forget_match(&self, match_id: Uuid) {
        self.match_locks
            .remove_if(&match_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    #[cfg(test)]
    pub(crate) fn tracked_locks(&self) -> usize {
        self.match_locks.len()
    }
}
