use axum::{Extension, Json, Router, extract::State, http::StatusCode, routing::get};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::Caller,
    dto::matches::{MatchDetails, MatchInput, MatchListQuery, MatchSummary, ResultInput, ResultView},
    error::AppError,
    routes::extract::{JsonBody, Path, Query},
    services::match_service,
    state::SharedState,
};

/// Match records and their results.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches", get(list_matches).post(create_match))
        .route("/me/matches", get(list_my_matches))
        .route(
            "/matches/{id}",
            get(get_match).put(update_match).delete(delete_match),
        )
        .route("/matches/{id}/result", get(get_result).post(register_result))
}

/// List matches, optionally filtered by level, first day and completion.
#[utoipa::path(
    get,
    path = "/matches",
    tag = "matches",
    params(
        ("Authorization" = String, Header, description = "Bearer token issued by the auth platform"),
        MatchListQuery
    ),
    responses((status = 200, description = "Matches ordered by date and start time", body = [MatchSummary]))
)]
pub async fn list_matches(
    State(state): State<SharedState>,
    Query(query): Query<MatchListQuery>,
) -> Result<Json<Vec<MatchSummary>>, AppError> {
    Ok(Json(
        match_service::list_matches(&state, query.into()).await?,
    ))
}

/// Create a match; the caller becomes its creator and first confirmed player.
#[utoipa::path(
    post,
    path = "/matches",
    tag = "matches",
    params(("Authorization" = String, Header, description = "Bearer token issued by the auth platform")),
    request_body = MatchInput,
    responses(
        (status = 201, description = "Match created", body = MatchSummary),
        (status = 400, description = "Invalid match fields")
    )
)]
pub async fn create_match(
    State(state): State<SharedState>,
    Extension(caller): Extension<Caller>,
    JsonBody(payload): JsonBody<MatchInput>,
) -> Result<(StatusCode, Json<MatchSummary>), AppError> {
    payload.validate()?;
    let summary = match_service::create_match(&state, caller.id, payload).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Matches the caller created or appears in.
#[utoipa::path(
    get,
    path = "/me/matches",
    tag = "matches",
    params(("Authorization" = String, Header, description = "Bearer token issued by the auth platform")),
    responses((status = 200, description = "Caller's matches", body = [MatchSummary]))
)]
pub async fn list_my_matches(
    State(state): State<SharedState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<MatchSummary>>, AppError> {
    Ok(Json(match_service::list_my_matches(&state, caller.id).await?))
}

#[utoipa::path(
    get,
    path = "/matches/{id}",
    tag = "matches",
    params(
        ("Authorization" = String, Header, description = "Bearer token issued by the auth platform"),
        ("id" = Uuid, Path, description = "Match identifier")
    ),
    responses(
        (status = 200, description = "Match with roster and result", body = MatchDetails),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchDetails>, AppError> {
    Ok(Json(match_service::get_match(&state, id).await?))
}

/// Edit a match. Creator only.
#[utoipa::path(
    put,
    path = "/matches/{id}",
    tag = "matches",
    params(
        ("Authorization" = String, Header, description = "Bearer token issued by the auth platform"),
        ("id" = Uuid, Path, description = "Match identifier")
    ),
    request_body = MatchInput,
    responses(
        (status = 200, description = "Match updated", body = MatchSummary),
        (status = 403, description = "Caller is not the creator")
    )
)]
pub async fn update_match(
    State(state): State<SharedState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<MatchInput>,
) -> Result<Json<MatchSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        match_service::update_match(&state, id, caller.id, payload).await?,
    ))
}

/// Delete a match with its roster and result. Creator only.
#[utoipa::path(
    delete,
    path = "/matches/{id}",
    tag = "matches",
    params(
        ("Authorization" = String, Header, description = "Bearer token issued by the auth platform"),
        ("id" = Uuid, Path, description = "Match identifier")
    ),
    responses(
        (status = 204, description = "Match deleted"),
        (status = 403, description = "Caller is not the creator")
    )
)]
pub async fn delete_match(
    State(state): State<SharedState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    match_service::delete_match(&state, id, caller.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/matches/{id}/result",
    tag = "matches",
    params(
        ("Authorization" = String, Header, description = "Bearer token issued by the auth platform"),
        ("id" = Uuid, Path, description = "Match identifier")
    ),
    responses(
        (status = 200, description = "Recorded result", body = ResultView),
        (status = 404, description = "No result recorded")
    )
)]
pub async fn get_result(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResultView>, AppError> {
    Ok(Json(match_service::get_result(&state, id).await?))
}

/// Record the final score of a finished match. Creator only, once.
#[utoipa::path(
    post,
    path = "/matches/{id}/result",
    tag = "matches",
    params(
        ("Authorization" = String, Header, description = "Bearer token issued by the auth platform"),
        ("id" = Uuid, Path, description = "Match identifier")
    ),
    request_body = ResultInput,
    responses(
        (status = 201, description = "Result recorded and match completed", body = ResultView),
        (status = 403, description = "Caller is not the creator"),
        (status = 409, description = "Match not over yet or result already recorded")
    )
)]
pub async fn register_result(
    State(state): State<SharedState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<ResultInput>,
) -> Result<(StatusCode, Json<ResultView>), AppError> {
    payload.validate()?;
    let result = match_service::register_result(&state, id, caller.id, payload).await?;
    Ok((StatusCode::CREATED, Json(result)))
}
