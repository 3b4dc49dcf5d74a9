//! In-process backend mirroring the relational constraints of the hosted store.

use std::{collections::HashMap, sync::Arc};

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    models::{MatchEntity, MatchPlayerEntity, MatchResultEntity, NotificationEntity},
    roster_store::{MatchFilter, RosterStore},
    storage::{StorageError, StorageResult},
};

#[derive(Default)]
struct Tables {
    matches: HashMap<Uuid, MatchEntity>,
    match_players: Vec<MatchPlayerEntity>,
    match_results: HashMap<Uuid, MatchResultEntity>,
    notifications: Vec<NotificationEntity>,
}

/// Volatile [`RosterStore`] keeping every table in memory.
///
/// Enforces the unique `(match_id, player_id)` pair on `match_players` and the single result
/// per match, like the schema of the hosted database does.
#[derive(Clone, Default)]
pub struct MemoryRosterStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryRosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications written so far.
    pub async fn notifications(&self) -> Vec<NotificationEntity> {
        self.tables.read().await.notifications.clone()
    }
}

impl RosterStore for MemoryRosterStore {
    fn insert_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let mut guard = tables.write().await;
            if guard.matches.contains_key(&entity.id) {
                return Err(StorageError::conflict(format!(
                    "match `{}` already exists",
                    entity.id
                )));
            }
            guard.matches.insert(entity.id, entity);
            Ok(())
        })
    }

    fn update_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let mut guard = tables.write().await;
            match guard.matches.get_mut(&entity.id) {
                Some(slot) => {
                    *slot = entity;
                    Ok(())
                }
                None => Err(StorageError::not_found(format!("match `{}`", entity.id))),
            }
        })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move { Ok(tables.read().await.matches.get(&id).cloned()) })
    }

    fn list_matches(
        &self,
        filter: MatchFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let guard = tables.read().await;
            let mut matches = guard
                .matches
                .values()
                .filter(|entity| filter.matches(entity))
                .cloned()
                .collect::<Vec<_>>();
            matches.sort_by_key(|entity| (entity.match_date, entity.start_time));
            Ok(matches)
        })
    }

    fn list_matches_involving(
        &self,
        player_id: Uuid,
        joined: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let guard = tables.read().await;
            let mut matches = guard
                .matches
                .values()
                .filter(|entity| entity.creator_id == player_id || joined.contains(&entity.id))
                .cloned()
                .collect::<Vec<_>>();
            matches.sort_by_key(|entity| (entity.match_date, entity.start_time));
            Ok(matches)
        })
    }

    fn delete_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let mut guard = tables.write().await;
            // Foreign keys from match_players/match_results are not cascading.
            if guard.match_players.iter().any(|row| row.match_id == id)
                || guard.match_results.contains_key(&id)
            {
                return Err(StorageError::conflict(format!(
                    "match `{id}` is still referenced by roster or result rows"
                )));
            }
            Ok(guard.matches.remove(&id).is_some())
        })
    }

    fn list_match_players(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchPlayerEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let guard = tables.read().await;
            Ok(guard
                .match_players
                .iter()
                .filter(|row| row.match_id == match_id)
                .cloned()
                .collect())
        })
    }

    fn list_rosters(
        &self,
        match_ids: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchPlayerEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let guard = tables.read().await;
            Ok(guard
                .match_players
                .iter()
                .filter(|row| match_ids.contains(&row.match_id))
                .cloned()
                .collect())
        })
    }

    fn list_player_memberships(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchPlayerEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let guard = tables.read().await;
            Ok(guard
                .match_players
                .iter()
                .filter(|row| row.player_id == player_id)
                .cloned()
                .collect())
        })
    }

    fn insert_match_players(
        &self,
        rows: Vec<MatchPlayerEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let mut guard = tables.write().await;
            for (index, row) in rows.iter().enumerate() {
                let duplicate_in_table = guard
                    .match_players
                    .iter()
                    .any(|existing| existing.match_id == row.match_id && existing.player_id == row.player_id);
                let duplicate_in_batch = rows[..index]
                    .iter()
                    .any(|other| other.match_id == row.match_id && other.player_id == row.player_id);
                if duplicate_in_table || duplicate_in_batch {
                    return Err(StorageError::conflict(format!(
                        "player `{}` already has a row in match `{}`",
                        row.player_id, row.match_id
                    )));
                }
            }
            guard.match_players.extend(rows);
            Ok(())
        })
    }

    fn update_match_player(
        &self,
        row: MatchPlayerEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let mut guard = tables.write().await;
            let Some(slot) = guard
                .match_players
                .iter_mut()
                .find(|existing| existing.match_id == row.match_id && existing.player_id == row.player_id)
            else {
                return Err(StorageError::not_found(format!(
                    "player `{}` in match `{}`",
                    row.player_id, row.match_id
                )));
            };
            slot.status = row.status;
            slot.team = row.team;
            slot.position = row.position;
            slot.response_at = row.response_at;
            slot.updated_at = row.updated_at;
            Ok(())
        })
    }

    fn delete_match_player(
        &self,
        match_id: Uuid,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let mut guard = tables.write().await;
            let before = guard.match_players.len();
            guard
                .match_players
                .retain(|row| !(row.match_id == match_id && row.player_id == player_id));
            Ok(guard.match_players.len() != before)
        })
    }

    fn delete_match_players(&self, match_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let mut guard = tables.write().await;
            let before = guard.match_players.len();
            guard.match_players.retain(|row| row.match_id != match_id);
            Ok((before - guard.match_players.len()) as u64)
        })
    }

    fn find_result(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<MatchResultEntity>>> {
        let tables = self.tables.clone();
        Box::pin(async move { Ok(tables.read().await.match_results.get(&match_id).cloned()) })
    }

    fn insert_result(&self, result: MatchResultEntity) -> BoxFuture<'static, StorageResult<()>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            let mut guard = tables.write().await;
            if guard.match_results.contains_key(&result.match_id) {
                return Err(StorageError::conflict(format!(
                    "match `{}` already has a result",
                    result.match_id
                )));
            }
            guard.match_results.insert(result.match_id, result);
            Ok(())
        })
    }

    fn delete_result(&self, match_id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            Ok(tables
                .write()
                .await
                .match_results
                .remove(&match_id)
                .is_some())
        })
    }

    fn insert_notifications(
        &self,
        notifications: Vec<NotificationEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let tables = self.tables.clone();
        Box::pin(async move {
            tables.write().await.notifications.extend(notifications);
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
