//! Fixtures shared by the service tests.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use time::{Duration as Span, OffsetDateTime, macros::time};
use uuid::Uuid;

use crate::{
    auth::AuthConfig,
    config::AppConfig,
    dao::{
        models::{
            MatchEntity, MatchLevel, MatchPlayerEntity, MatchResultEntity, NotificationEntity,
        },
        roster_store::{MatchFilter, RosterStore, memory::MemoryRosterStore},
        storage::StorageResult,
    },
    dto::matches::MatchInput,
    state::{AppState, SharedState},
};

/// Shared state backed by a fresh in-memory store, plus a handle on that store.
pub async fn state() -> (SharedState, MemoryRosterStore) {
    let state = degraded_state();
    let store = MemoryRosterStore::new();
    state.install_roster_store(Arc::new(store.clone())).await;
    (state, store)
}

/// Shared state without any store installed.
pub fn degraded_state() -> SharedState {
    AppState::new(
        AppConfig::default().with_operation_timeout(Duration::from_secs(5)),
        AuthConfig::new("service-tests"),
    )
}

/// State whose store takes `delay` on every match update, with a shorter lock timeout.
pub async fn slow_state(delay: Duration, lock_timeout: Duration) -> (SharedState, MemoryRosterStore) {
    let state = AppState::new(
        AppConfig::default().with_operation_timeout(lock_timeout),
        AuthConfig::new("service-tests"),
    );
    let store = MemoryRosterStore::new();
    let slow = SlowRosterStore {
        inner: store.clone(),
        delay,
    };
    state.install_roster_store(Arc::new(slow)).await;
    (state, store)
}

/// Memory store whose match updates stall like a congested gateway.
struct SlowRosterStore {
    inner: MemoryRosterStore,
    delay: Duration,
}

impl RosterStore for SlowRosterStore {
    fn insert_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.insert_match(entity)
    }

    fn update_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let update = self.inner.update_match(entity);
        let delay = self.delay;
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            update.await
        })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        self.inner.find_match(id)
    }

    fn list_matches(
        &self,
        filter: MatchFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        self.inner.list_matches(filter)
    }

    fn list_matches_involving(
        &self,
        player_id: Uuid,
        joined: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        self.inner.list_matches_involving(player_id, joined)
    }

    fn delete_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.inner.delete_match(id)
    }

    fn list_match_players(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchPlayerEntity>>> {
        self.inner.list_match_players(match_id)
    }

    fn list_rosters(
        &self,
        match_ids: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchPlayerEntity>>> {
        self.inner.list_rosters(match_ids)
    }

    fn list_player_memberships(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchPlayerEntity>>> {
        self.inner.list_player_memberships(player_id)
    }

    fn insert_match_players(
        &self,
        rows: Vec<MatchPlayerEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.insert_match_players(rows)
    }

    fn update_match_player(
        &self,
        row: MatchPlayerEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.update_match_player(row)
    }

    fn delete_match_player(
        &self,
        match_id: Uuid,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.inner.delete_match_player(match_id, player_id)
    }

    fn delete_match_players(&self, match_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        self.inner.delete_match_players(match_id)
    }

    fn find_result(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<MatchResultEntity>>> {
        self.inner.find_result(match_id)
    }

    fn insert_result(&self, result: MatchResultEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.insert_result(result)
    }

    fn delete_result(&self, match_id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.inner.delete_result(match_id)
    }

    fn insert_notifications(
        &self,
        notifications: Vec<NotificationEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.insert_notifications(notifications)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.health_check()
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.try_reconnect()
    }
}

fn input_on(days_from_today: i64) -> MatchInput {
    MatchInput {
        match_date: OffsetDateTime::now_utc().date() + Span::days(days_from_today),
        start_time: time!(18:00),
        end_time: time!(19:30),
        level: MatchLevel::Medio,
        court_id: None,
        price_per_player: Some(6.0),
        notes: None,
    }
}

/// A match a month from now.
pub fn upcoming_input() -> MatchInput {
    input_on(30)
}

/// A match that ended two days ago.
pub fn played_input() -> MatchInput {
    input_on(-2)
}
