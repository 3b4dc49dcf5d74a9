pub mod memory;
#[cfg(feature = "postgrest-store")]
pub mod postgrest;

use futures::future::BoxFuture;
use time::Date;
use uuid::Uuid;

use crate::dao::models::{
    MatchEntity, MatchLevel, MatchPlayerEntity, MatchResultEntity, NotificationEntity,
};
use crate::dao::storage::StorageResult;

/// Server-side filters applied when listing matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchFilter {
    /// Only matches advertised at this level.
    pub level: Option<MatchLevel>,
    /// Only matches played on or after this day.
    pub from_date: Option<Date>,
    /// Only matches whose completion flag equals this value.
    pub completed: Option<bool>,
}

impl MatchFilter {
    /// Whether `entity` satisfies every populated criterion.
    pub fn matches(&self, entity: &MatchEntity) -> bool {
        self.level.is_none_or(|level| entity.level == level)
            && self.from_date.is_none_or(|from| entity.match_date >= from)
            && self.completed.is_none_or(|flag| entity.is_completed == flag)
    }
}

/// Query/mutation client over the `matches`, `match_players`, `match_results` and
/// `notifications` tables.
///
/// Every call is a single round trip to the store; callers re-read state before deciding.
/// Multi-row inserts are applied all-or-nothing by every backend.
pub trait RosterStore: Send + Sync {
    fn insert_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace a match row. Fails with [`StorageError::NotFound`] when the row is gone.
    ///
    /// [`StorageError::NotFound`]: crate::dao::storage::StorageError::NotFound
    fn update_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;
    /// Matches satisfying `filter`, ordered by date then start time.
    fn list_matches(&self, filter: MatchFilter)
    -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>>;
    /// Matches created by `player_id` or listed in `joined`, ordered like [`list_matches`].
    ///
    /// [`list_matches`]: RosterStore::list_matches
    fn list_matches_involving(
        &self,
        player_id: Uuid,
        joined: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>>;
    /// Delete a match row, returning whether it existed.
    fn delete_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Roster rows of a match in creation order.
    fn list_match_players(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchPlayerEntity>>>;
    /// Roster rows of several matches in one round trip, in creation order.
    fn list_rosters(
        &self,
        match_ids: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchPlayerEntity>>>;
    /// Every roster row held by a player, across matches.
    fn list_player_memberships(
        &self,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchPlayerEntity>>>;
    /// Insert roster rows atomically. A duplicate `(match_id, player_id)` pair rejects the
    /// whole batch with [`StorageError::Conflict`].
    ///
    /// [`StorageError::Conflict`]: crate::dao::storage::StorageError::Conflict
    fn insert_match_players(
        &self,
        rows: Vec<MatchPlayerEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Persist status, team, position and timestamps of an existing roster row.
    fn update_match_player(&self, row: MatchPlayerEntity)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Delete one roster row, returning whether it existed.
    fn delete_match_player(
        &self,
        match_id: Uuid,
        player_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Delete every roster row of a match, returning how many were removed.
    fn delete_match_players(&self, match_id: Uuid) -> BoxFuture<'static, StorageResult<u64>>;

    fn find_result(
        &self,
        match_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<MatchResultEntity>>>;
    /// Insert a result. A second result for the same match is a conflict.
    fn insert_result(&self, result: MatchResultEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn delete_result(&self, match_id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    fn insert_notifications(
        &self,
        notifications: Vec<NotificationEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
