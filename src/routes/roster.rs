use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::Caller,
    dto::roster::{
        AssignRequest, InviteRequest, InviteResponse, RespondRequest, RosterEntry, RosterView,
    },
    error::AppError,
    routes::extract::{JsonBody, Path},
    services::roster_service,
    state::SharedState,
};

/// Invitation, membership and waitlist operations on a match roster.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches/{id}/players", get(get_roster))
        .route("/matches/{id}/invitations", post(invite_players))
        .route("/matches/{id}/invitation", post(respond_to_invitation))
        .route("/matches/{id}/join", post(join_match))
        .route("/matches/{id}/leave", post(leave_match))
        .route(
            "/matches/{id}/players/{player_id}",
            put(assign_team_position).delete(remove_player),
        )
        .route(
            "/matches/{id}/players/{player_id}/promote",
            post(promote_player),
        )
}

/// Roster grouped by status, each list in arrival order.
#[utoipa::path(
    get,
    path = "/matches/{id}/players",
    tag = "roster",
    params(
        ("Authorization" = String, Header, description = "Bearer token issued by the auth platform"),
        ("id" = Uuid, Path, description = "Match identifier")
    ),
    responses(
        (status = 200, description = "Match roster", body = RosterView),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn get_roster(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RosterView>, AppError> {
    Ok(Json(roster_service::get_roster(&state, id).await?))
}

/// Invite players to the match. Players already on the roster are reported as skipped.
#[utoipa::path(
    post,
    path = "/matches/{id}/invitations",
    tag = "roster",
    params(
        ("Authorization" = String, Header, description = "Bearer token issued by the auth platform"),
        ("id" = Uuid, Path, description = "Match identifier")
    ),
    request_body = InviteRequest,
    responses(
        (status = 200, description = "Invitation outcome", body = InviteResponse),
        (status = 403, description = "Caller is not the creator")
    )
)]
pub async fn invite_players(
    State(state): State<SharedState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<InviteRequest>,
) -> Result<Json<InviteResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        roster_service::invite(&state, id, caller.id, &payload.player_ids).await?,
    ))
}

/// Accept or reject the caller's pending invitation.
#[utoipa::path(
    post,
    path = "/matches/{id}/invitation",
    tag = "roster",
    params(
        ("Authorization" = String, Header, description = "Bearer token issued by the auth platform"),
        ("id" = Uuid, Path, description = "Match identifier")
    ),
    request_body = RespondRequest,
    responses(
        (status = 200, description = "Updated membership", body = RosterEntry),
        (status = 404, description = "Caller has no row in the match"),
        (status = 409, description = "Caller's row is not a pending invitation")
    )
)]
pub async fn respond_to_invitation(
    State(state): State<SharedState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<RespondRequest>,
) -> Result<Json<RosterEntry>, AppError> {
    Ok(Json(
        roster_service::respond(&state, id, caller.id, payload.decision.into()).await?,
    ))
}

/// Join the match, or its waitlist when all slots are taken.
#[utoipa::path(
    post,
    path = "/matches/{id}/join",
    tag = "roster",
    params(
        ("Authorization" = String, Header, description = "Bearer token issued by the auth platform"),
        ("id" = Uuid, Path, description = "Match identifier")
    ),
    responses(
        (status = 201, description = "Caller added as confirmed or waitlisted", body = RosterEntry),
        (status = 409, description = "Caller already has a row in the match")
    )
)]
pub async fn join_match(
    State(state): State<SharedState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<RosterEntry>), AppError> {
    let entry = roster_service::join(&state, id, caller.id).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Leave the match. Succeeds when the caller has no row.
#[utoipa::path(
    post,
    path = "/matches/{id}/leave",
    tag = "roster",
    params(
        ("Authorization" = String, Header, description = "Bearer token issued by the auth platform"),
        ("id" = Uuid, Path, description = "Match identifier")
    ),
    responses((status = 204, description = "Caller no longer on the roster"))
)]
pub async fn leave_match(
    State(state): State<SharedState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    roster_service::leave(&state, id, caller.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set the team and position of a confirmed player. Creator only.
#[utoipa::path(
    put,
    path = "/matches/{id}/players/{player_id}",
    tag = "roster",
    params(
        ("Authorization" = String, Header, description = "Bearer token issued by the auth platform"),
        ("id" = Uuid, Path, description = "Match identifier"),
        ("player_id" = Uuid, Path, description = "Player to assign")
    ),
    request_body = AssignRequest,
    responses(
        (status = 200, description = "Updated membership", body = RosterEntry),
        (status = 403, description = "Caller is not the creator"),
        (status = 409, description = "Player not confirmed or match already over")
    )
)]
pub async fn assign_team_position(
    State(state): State<SharedState>,
    Extension(caller): Extension<Caller>,
    Path((id, player_id)): Path<(Uuid, Uuid)>,
    JsonBody(payload): JsonBody<AssignRequest>,
) -> Result<Json<RosterEntry>, AppError> {
    let entry = roster_service::assign_team_position(
        &state,
        id,
        caller.id,
        player_id,
        payload.team,
        payload.position,
    )
    .await?;
    Ok(Json(entry))
}

/// Remove a player from the roster. Creator only.
#[utoipa::path(
    delete,
    path = "/matches/{id}/players/{player_id}",
    tag = "roster",
    params(
        ("Authorization" = String, Header, description = "Bearer token issued by the auth platform"),
        ("id" = Uuid, Path, description = "Match identifier"),
        ("player_id" = Uuid, Path, description = "Player to remove")
    ),
    responses(
        (status = 204, description = "Player removed"),
        (status = 403, description = "Caller is not the creator"),
        (status = 404, description = "Player not on the roster")
    )
)]
pub async fn remove_player(
    State(state): State<SharedState>,
    Extension(caller): Extension<Caller>,
    Path((id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    roster_service::remove_player(&state, id, caller.id, player_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Move a waitlisted player into a free slot. Creator only.
#[utoipa::path(
    post,
    path = "/matches/{id}/players/{player_id}/promote",
    tag = "roster",
    params(
        ("Authorization" = String, Header, description = "Bearer token issued by the auth platform"),
        ("id" = Uuid, Path, description = "Match identifier"),
        ("player_id" = Uuid, Path, description = "Waitlisted player")
    ),
    responses(
        (status = 200, description = "Player confirmed", body = RosterEntry),
        (status = 409, description = "Player not waitlisted or match full")
    )
)]
pub async fn promote_player(
    State(state): State<SharedState>,
    Extension(caller): Extension<Caller>,
    Path((id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RosterEntry>, AppError> {
    Ok(Json(
        roster_service::promote(&state, id, caller.id, player_id).await?,
    ))
}
