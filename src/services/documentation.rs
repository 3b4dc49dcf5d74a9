use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the padel roster service.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::matches::list_matches,
        crate::routes::matches::create_match,
        crate::routes::matches::list_my_matches,
        crate::routes::matches::get_match,
        crate::routes::matches::update_match,
        crate::routes::matches::delete_match,
        crate::routes::matches::get_result,
        crate::routes::matches::register_result,
        crate::routes::roster::get_roster,
        crate::routes::roster::invite_players,
        crate::routes::roster::respond_to_invitation,
        crate::routes::roster::join_match,
        crate::routes::roster::leave_match,
        crate::routes::roster::assign_team_position,
        crate::routes::roster::remove_player,
        crate::routes::roster::promote_player,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::matches::MatchInput,
            crate::dto::matches::MatchSummary,
            crate::dto::matches::MatchDetails,
            crate::dto::matches::ResultInput,
            crate::dto::matches::ResultView,
            crate::dto::roster::RosterEntry,
            crate::dto::roster::RosterView,
            crate::dto::roster::InviteRequest,
            crate::dto::roster::InviteResponse,
            crate::dto::roster::DecisionDto,
            crate::dto::roster::RespondRequest,
            crate::dto::roster::AssignRequest,
            crate::dao::models::PlayerStatus,
            crate::dao::models::MatchLevel,
            crate::dao::models::Team,
            crate::dao::models::Position,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "matches", description = "Match records and results"),
        (name = "roster", description = "Invitations, membership and waitlist of a match"),
    )
)]
pub struct ApiDoc;
