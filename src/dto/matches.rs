//! Match records as exchanged with clients.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use time::{Date, OffsetDateTime, Time};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    dao::{
        models::{MatchEntity, MatchLevel, MatchResultEntity},
        roster_store::MatchFilter,
        time_format,
    },
    dto::{roster::RosterView, validation::validate_time_window},
    state::{MATCH_CAPACITY, Roster},
};

/// Editable fields of a match, used by both creation and update.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_match_window"))]
pub struct MatchInput {
    /// Day of the match (`YYYY-MM-DD`).
    #[serde(with = "time_format::date")]
    #[schema(value_type = String, format = Date, example = "2024-05-17")]
    pub match_date: Date,
    /// Start time (`HH:MM`).
    #[serde(with = "time_format::time_of_day")]
    #[schema(value_type = String, example = "18:00")]
    pub start_time: Time,
    /// End time (`HH:MM`), later than the start time on the same day.
    #[serde(with = "time_format::time_of_day")]
    #[schema(value_type = String, example = "19:30")]
    pub end_time: Time,
    pub level: MatchLevel,
    #[serde(default)]
    pub court_id: Option<Uuid>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub price_per_player: Option<f64>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

fn validate_match_window(input: &MatchInput) -> Result<(), ValidationError> {
    validate_time_window(input.start_time, input.end_time)
}

/// Match row enriched with the values derived from its roster and clock.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchSummary {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub court_id: Option<Uuid>,
    #[serde(with = "time_format::date")]
    #[schema(value_type = String, format = Date)]
    pub match_date: Date,
    #[serde(with = "time_format::time_of_day")]
    #[schema(value_type = String)]
    pub start_time: Time,
    #[serde(with = "time_format::time_of_day")]
    #[schema(value_type = String)]
    pub end_time: Time,
    pub level: MatchLevel,
    pub price_per_player: Option<f64>,
    pub notes: Option<String>,
    pub is_completed: bool,
    /// True once the end time has passed.
    pub is_past: bool,
    pub confirmed_count: usize,
    /// True when all playing slots are taken; further joins land on the waitlist.
    pub is_full: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl MatchSummary {
    pub fn new(entity: &MatchEntity, confirmed_count: usize, is_past: bool) -> Self {
        Self {
            id: entity.id,
            creator_id: entity.creator_id,
            court_id: entity.court_id,
            match_date: entity.match_date,
            start_time: entity.start_time,
            end_time: entity.end_time,
            level: entity.level,
            price_per_player: entity.price_per_player,
            notes: entity.notes.clone(),
            is_completed: entity.is_completed,
            is_past,
            confirmed_count,
            is_full: confirmed_count >= MATCH_CAPACITY,
            created_at: entity.created_at,
        }
    }

    pub fn from_roster(entity: &MatchEntity, roster: &Roster, is_past: bool) -> Self {
        Self::new(entity, roster.confirmed_count(), is_past)
    }
}

/// Match with its roster and, once played, its result.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchDetails {
    #[serde(flatten)]
    pub summary: MatchSummary,
    pub roster: RosterView,
    pub result: Option<ResultView>,
}

/// Query string accepted by `GET /matches`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MatchListQuery {
    /// Only matches of this level.
    pub level: Option<MatchLevel>,
    /// Only matches on or after this day (`YYYY-MM-DD`).
    #[serde(default, deserialize_with = "time_format::date::option::deserialize")]
    #[param(value_type = Option<String>)]
    pub from: Option<Date>,
    /// Only completed (`true`) or pending (`false`) matches.
    pub completed: Option<bool>,
}

impl From<MatchListQuery> for MatchFilter {
    fn from(query: MatchListQuery) -> Self {
        MatchFilter {
            level: query.level,
            from_date: query.from,
            completed: query.completed,
        }
    }
}

/// Final score entered by the creator.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct ResultInput {
    #[validate(range(min = 0))]
    pub team_a_score: i32,
    #[validate(range(min = 0))]
    pub team_b_score: i32,
}

/// Recorded result of a match.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct ResultView {
    pub match_id: Uuid,
    pub team_a_score: i32,
    pub team_b_score: i32,
    pub recorded_by: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<MatchResultEntity> for ResultView {
    fn from(entity: MatchResultEntity) -> Self {
        Self {
            match_id: entity.match_id,
            team_a_score: entity.team_a_score,
            team_b_score: entity.team_b_score,
            recorded_by: entity.recorded_by,
            created_at: entity.created_at,
        }
    }
}
