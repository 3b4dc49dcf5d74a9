//! Roster mutations of a single match.
//!
//! Every mutation re-reads the roster inside the write lock of its match, asks [`Roster`] for
//! the row to write and persists it before the lock is released.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        models::{NotificationEntity, NotificationKind, Position, Team},
        storage::StorageError,
        time_format,
    },
    dto::roster::{InviteResponse, RosterEntry, RosterView},
    error::ServiceError,
    services::match_service::{ensure_creator, load_match, load_roster},
    state::{InvitationDecision, Roster, SharedState},
};

fn already_in_match(match_id: Uuid, player_id: Uuid) -> impl FnOnce(StorageError) -> ServiceError {
    move |err| {
        if err.is_conflict() {
            ServiceError::AlreadyInMatch {
                match_id,
                player_id,
            }
        } else {
            err.into()
        }
    }
}

/// Invite players to a match. Creator only.
///
/// Players already on the roster, or listed twice, are skipped without error. The new rows
/// are written in one batch; the notifications follow and never fail the invitation.
pub async fn invite(
    state: &SharedState,
    match_id: Uuid,
    caller: Uuid,
    player_ids: &[Uuid],
) -> Result<InviteResponse, ServiceError> {
    let store = state.require_store().await?;

    let (entity, plan) = state
        .run_exclusive(match_id, || async {
            let entity = load_match(&store, match_id).await?;
            ensure_creator(&entity, caller, "invite players")?;

            let roster = load_roster(&store, match_id).await?;
            let plan = roster.plan_invitations(player_ids, state.now());
            store.insert_match_players(plan.rows.clone()).await?;
            Ok((entity, plan))
        })
        .await?;

    let invited: Vec<Uuid> = plan.rows.iter().map(|row| row.player_id).collect();
    if !plan.skipped.is_empty() {
        debug!(match_id = %match_id, skipped = ?plan.skipped, "players already on the roster");
    }

    if !invited.is_empty() {
        let config = state.config();
        let date = time_format::date::format(&entity.match_date).unwrap_or_default();
        let start = time_format::time_of_day::format(&entity.start_time).unwrap_or_default();
        let message = config.invitation_message(&date, &start);
        let now = state.now();

        let notifications = invited
            .iter()
            .map(|&user_id| NotificationEntity {
                id: Uuid::new_v4(),
                user_id,
                kind: NotificationKind::MatchInvitation,
                title: config.invitation_title().to_string(),
                message: message.clone(),
                related_id: Some(match_id),
                is_read: false,
                created_at: now,
            })
            .collect();

        if let Err(err) = store.insert_notifications(notifications).await {
            warn!(match_id = %match_id, error = %err, "failed to record invitation notifications");
        }
        info!(match_id = %match_id, invited = invited.len(), "players invited");
    }

    Ok(InviteResponse {
        invited,
        skipped: plan.skipped,
    })
}

/// Add the caller to a match: confirmed while a slot is free, waitlisted otherwise.
pub async fn join(
    state: &SharedState,
    match_id: Uuid,
    caller: Uuid,
) -> Result<RosterEntry, ServiceError> {
    let store = state.require_store().await?;

    let row = state
        .run_exclusive(match_id, || async {
            load_match(&store, match_id).await?;
            let roster = load_roster(&store, match_id).await?;
            let row = roster.plan_join(caller, state.now())?;
            store
                .insert_match_players(vec![row.clone()])
                .await
                .map_err(already_in_match(match_id, caller))?;
            Ok(row)
        })
        .await?;

    info!(match_id = %match_id, player_id = %caller, status = row.status.as_str(), "player joined");
    Ok(row.into())
}

/// Remove the caller's own row whatever its status. Succeeds when there is none.
pub async fn leave(state: &SharedState, match_id: Uuid, caller: Uuid) -> Result<(), ServiceError> {
    let store = state.require_store().await?;

    let removed = state
        .run_exclusive(match_id, || async {
            Ok(store.delete_match_player(match_id, caller).await?)
        })
        .await?;

    if removed {
        info!(match_id = %match_id, player_id = %caller, "player left");
    } else {
        debug!(match_id = %match_id, player_id = %caller, "leave without a roster row");
    }
    Ok(())
}

/// Answer the caller's pending invitation.
///
/// Accepting a full match puts the player on the waitlist.
pub async fn respond(
    state: &SharedState,
    match_id: Uuid,
    caller: Uuid,
    decision: InvitationDecision,
) -> Result<RosterEntry, ServiceError> {
    let store = state.require_store().await?;

    let row = state
        .run_exclusive(match_id, || async {
            load_match(&store, match_id).await?;
            let roster = load_roster(&store, match_id).await?;
            let row = roster.plan_response(caller, decision, state.now())?;
            store.update_match_player(row.clone()).await?;
            Ok(row)
        })
        .await?;

    info!(
        match_id = %match_id,
        player_id = %caller,
        decision = ?decision,
        status = row.status.as_str(),
        "invitation answered"
    );
    Ok(row.into())
}

/// Set the team and position of a confirmed player. Creator only, before the match ends.
pub async fn assign_team_position(
    state: &SharedState,
    match_id: Uuid,
    caller: Uuid,
    player_id: Uuid,
    team: Option<Team>,
    position: Option<Position>,
) -> Result<RosterEntry, ServiceError> {
    let store = state.require_store().await?;

    let row = state
        .run_exclusive(match_id, || async {
            let entity = load_match(&store, match_id).await?;
            ensure_creator(&entity, caller, "assign teams")?;
            if state.match_is_past(&entity) {
                return Err(ServiceError::InvalidState(format!(
                    "match `{match_id}` is over; teams can no longer change"
                )));
            }

            let roster = load_roster(&store, match_id).await?;
            let row = roster.plan_assignment(player_id, team, position, state.now())?;
            store.update_match_player(row.clone()).await?;
            Ok(row)
        })
        .await?;

    debug!(
        match_id = %match_id,
        player_id = %player_id,
        team = ?team,
        position = ?position,
        "assignment updated"
    );
    Ok(row.into())
}

/// Drop another player from the roster. Creator only; the creator leaves through [`leave`].
pub async fn remove_player(
    state: &SharedState,
    match_id: Uuid,
    caller: Uuid,
    player_id: Uuid,
) -> Result<(), ServiceError> {
    let store = state.require_store().await?;

    state
        .run_exclusive(match_id, || async {
            let entity = load_match(&store, match_id).await?;
            ensure_creator(&entity, caller, "remove players")?;
            if player_id == caller {
                return Err(ServiceError::InvalidState(
                    "the creator cannot remove themselves from their match".into(),
                ));
            }

            if !store.delete_match_player(match_id, player_id).await? {
                return Err(ServiceError::NotFound(format!(
                    "player `{player_id}` is not on the roster of match `{match_id}`"
                )));
            }
            Ok(())
        })
        .await?;

    info!(match_id = %match_id, player_id = %player_id, "player removed");
    Ok(())
}

/// Move a waitlisted player into a free slot. Creator only; never triggered automatically.
pub async fn promote(
    state: &SharedState,
    match_id: Uuid,
    caller: Uuid,
    player_id: Uuid,
) -> Result<RosterEntry, ServiceError> {
    let store = state.require_store().await?;

    let row = state
        .run_exclusive(match_id, || async {
            let entity = load_match(&store, match_id).await?;
            ensure_creator(&entity, caller, "promote players")?;

            let roster = load_roster(&store, match_id).await?;
            let row = roster.plan_promotion(player_id, state.now())?;
            store.update_match_player(row.clone()).await?;
            Ok(row)
        })
        .await?;

    info!(match_id = %match_id, player_id = %player_id, "player promoted from the waitlist");
    Ok(row.into())
}

/// Roster of a match grouped by status.
pub async fn get_roster(state: &SharedState, match_id: Uuid) -> Result<RosterView, ServiceError> {
    let store = state.require_store().await?;
    load_match(&store, match_id).await?;
    let roster: Roster = load_roster(&store, match_id).await?;
    Ok(RosterView::from(&roster))
}
