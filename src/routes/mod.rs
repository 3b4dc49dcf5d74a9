use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};
use tracing::debug;

use crate::{error::AppError, state::SharedState};

pub mod docs;
pub mod extract;
pub mod health;
pub mod matches;
pub mod roster;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let protected = matches::router()
        .merge(roster::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_caller));

    health::router()
        .merge(protected)
        .merge(docs::router())
        .with_state(state)
}

/// Verify the bearer token and expose the caller identity to the handlers.
async fn require_caller(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;

    let caller = state.auth().verify(token).map_err(|err| {
        debug!(error = %err, "rejected bearer token");
        AppError::Unauthorized(err.to_string())
    })?;

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}
