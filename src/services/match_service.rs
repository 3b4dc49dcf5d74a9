//! Match records: creation, edition, projections, deletion and results.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{MatchEntity, MatchPlayerEntity, MatchResultEntity, PlayerStatus},
        roster_store::{MatchFilter, RosterStore},
    },
    dto::{
        matches::{MatchDetails, MatchInput, MatchSummary, ResultInput, ResultView},
        roster::RosterView,
    },
    error::ServiceError,
    state::{Roster, SharedState},
};

/// Fetch a match or fail with [`ServiceError::NotFound`].
pub(crate) async fn load_match(
    store: &Arc<dyn RosterStore>,
    match_id: Uuid,
) -> Result<MatchEntity, ServiceError> {
    store
        .find_match(match_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("match `{match_id}` not found")))
}

/// Rebuild the roster of a match from its authoritative rows.
pub(crate) async fn load_roster(
    store: &Arc<dyn RosterStore>,
    match_id: Uuid,
) -> Result<Roster, ServiceError> {
    let rows = store.list_match_players(match_id).await?;
    Ok(Roster::new(match_id, rows))
}

pub(crate) fn ensure_creator(
    entity: &MatchEntity,
    caller: Uuid,
    action: &str,
) -> Result<(), ServiceError> {
    if entity.creator_id != caller {
        return Err(ServiceError::PermissionDenied(format!(
            "only the creator of match `{}` may {action}",
            entity.id
        )));
    }
    Ok(())
}

fn apply_input(entity: &mut MatchEntity, input: MatchInput) {
    entity.match_date = input.match_date;
    entity.start_time = input.start_time;
    entity.end_time = input.end_time;
    entity.level = input.level;
    entity.court_id = input.court_id;
    entity.price_per_player = input.price_per_player;
    entity.notes = input.notes.filter(|notes| !notes.trim().is_empty());
}

async fn summarize(
    state: &SharedState,
    store: &Arc<dyn RosterStore>,
    entity: &MatchEntity,
) -> Result<MatchSummary, ServiceError> {
    let roster = load_roster(store, entity.id).await?;
    Ok(MatchSummary::from_roster(
        entity,
        &roster,
        state.match_is_past(entity),
    ))
}

/// Summaries of several matches, reading all their rosters in a single store call.
async fn summarize_all(
    state: &SharedState,
    store: &Arc<dyn RosterStore>,
    entities: Vec<MatchEntity>,
) -> Result<Vec<MatchSummary>, ServiceError> {
    let ids = entities.iter().map(|entity| entity.id).collect();
    let mut rows_by_match: HashMap<Uuid, Vec<MatchPlayerEntity>> = HashMap::new();
    for row in store.list_rosters(ids).await? {
        rows_by_match.entry(row.match_id).or_default().push(row);
    }

    Ok(entities
        .iter()
        .map(|entity| {
            let rows = rows_by_match.remove(&entity.id).unwrap_or_default();
            let roster = Roster::new(entity.id, rows);
            MatchSummary::from_roster(entity, &roster, state.match_is_past(entity))
        })
        .collect())
}

/// Create a match owned by `creator`, who takes the first confirmed slot.
pub async fn create_match(
    state: &SharedState,
    creator: Uuid,
    input: MatchInput,
) -> Result<MatchSummary, ServiceError> {
    let store = state.require_store().await?;
    let now = state.now();

    let mut entity = MatchEntity {
        id: Uuid::new_v4(),
        creator_id: creator,
        court_id: None,
        match_date: input.match_date,
        start_time: input.start_time,
        end_time: input.end_time,
        level: input.level,
        price_per_player: None,
        notes: None,
        is_completed: false,
        created_at: now,
        updated_at: now,
    };
    apply_input(&mut entity, input);

    store.insert_match(entity.clone()).await?;

    let creator_row = MatchPlayerEntity::new(entity.id, creator, PlayerStatus::Confirmed, now);
    if let Err(err) = store.insert_match_players(vec![creator_row]).await {
        if let Err(cleanup) = store.delete_match(entity.id).await {
            warn!(
                match_id = %entity.id,
                error = %cleanup,
                "failed to remove match after creator seat insert failure"
            );
        }
        return Err(err.into());
    }

    info!(match_id = %entity.id, creator = %creator, date = %entity.match_date, "match created");
    Ok(MatchSummary::new(&entity, 1, state.match_is_past(&entity)))
}

/// Replace the editable fields of a match. Creator only.
pub async fn update_match(
    state: &SharedState,
    match_id: Uuid,
    caller: Uuid,
    input: MatchInput,
) -> Result<MatchSummary, ServiceError> {
    let store = state.require_store().await?;

    let entity = state
        .run_exclusive(match_id, || async {
            let mut entity = load_match(&store, match_id).await?;
            ensure_creator(&entity, caller, "edit it")?;

            apply_input(&mut entity, input);
            entity.updated_at = state.now();
            store.update_match(entity.clone()).await?;
            Ok(entity)
        })
        .await?;

    info!(match_id = %match_id, "match updated");
    summarize(state, &store, &entity).await
}

/// Match, roster projection and result if one was recorded.
pub async fn get_match(state: &SharedState, match_id: Uuid) -> Result<MatchDetails, ServiceError> {
    let store = state.require_store().await?;
    let entity = load_match(&store, match_id).await?;
    let roster = load_roster(&store, match_id).await?;
    let result = store.find_result(match_id).await?;

    Ok(MatchDetails {
        summary: MatchSummary::from_roster(&entity, &roster, state.match_is_past(&entity)),
        roster: RosterView::from(&roster),
        result: result.map(ResultView::from),
    })
}

/// Matches satisfying `filter`, ordered by date then start time.
pub async fn list_matches(
    state: &SharedState,
    filter: MatchFilter,
) -> Result<Vec<MatchSummary>, ServiceError> {
    let store = state.require_store().await?;
    let entities = store.list_matches(filter).await?;
    summarize_all(state, &store, entities).await
}

/// Matches the caller created or holds any roster row in.
pub async fn list_my_matches(
    state: &SharedState,
    caller: Uuid,
) -> Result<Vec<MatchSummary>, ServiceError> {
    let store = state.require_store().await?;
    let joined: HashSet<Uuid> = store
        .list_player_memberships(caller)
        .await?
        .into_iter()
        .map(|row| row.match_id)
        .collect();

    let entities = store
        .list_matches_involving(caller, joined.into_iter().collect())
        .await?;
    summarize_all(state, &store, entities).await
}

/// Delete a match with its roster rows and result. Creator only.
///
/// Dependents go first so no roster row outlives its match.
pub async fn delete_match(
    state: &SharedState,
    match_id: Uuid,
    caller: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;

    let removed_players = state
        .run_exclusive(match_id, || async {
            let entity = load_match(&store, match_id).await?;
            ensure_creator(&entity, caller, "delete it")?;

            let removed_players = store.delete_match_players(match_id).await?;
            if store.delete_result(match_id).await? {
                debug!(match_id = %match_id, "removed recorded result");
            }
            if !store.delete_match(match_id).await? {
                return Err(ServiceError::NotFound(format!(
                    "match `{match_id}` not found"
                )));
            }
            Ok(removed_players)
        })
        .await?;

    info!(match_id = %match_id, removed_players, "match deleted");
    Ok(())
}

/// Record the final score once the match is over. Creator only, once per match.
pub async fn register_result(
    state: &SharedState,
    match_id: Uuid,
    caller: Uuid,
    input: ResultInput,
) -> Result<ResultView, ServiceError> {
    let store = state.require_store().await?;

    let result = state
        .run_exclusive(match_id, || async {
            let mut entity = load_match(&store, match_id).await?;
            ensure_creator(&entity, caller, "register its result")?;

            if !state.match_is_past(&entity) {
                return Err(ServiceError::NotYetPlayable(match_id));
            }
            if store.find_result(match_id).await?.is_some() {
                return Err(ServiceError::AlreadyRecorded(match_id));
            }

            let now = state.now();
            let result = MatchResultEntity {
                id: Uuid::new_v4(),
                match_id,
                team_a_score: input.team_a_score,
                team_b_score: input.team_b_score,
                recorded_by: caller,
                created_at: now,
                updated_at: now,
            };
            store
                .insert_result(result.clone())
                .await
                .map_err(|err| {
                    if err.is_conflict() {
                        ServiceError::AlreadyRecorded(match_id)
                    } else {
                        err.into()
                    }
                })?;

            entity.is_completed = true;
            entity.updated_at = now;
            store.update_match(entity).await?;
            Ok(result)
        })
        .await?;

    info!(
        match_id = %match_id,
        team_a = result.team_a_score,
        team_b = result.team_b_score,
        "match result registered"
    );
    Ok(result.into())
}

/// Recorded result of a match.
pub async fn get_result(state: &SharedState, match_id: Uuid) -> Result<ResultView, ServiceError> {
    let store = state.require_store().await?;
    store
        .find_result(match_id)
        .await?
        .map(ResultView::from)
        .ok_or_else(|| ServiceError::NotFound(format!("match `{match_id}` has no result")))
}
