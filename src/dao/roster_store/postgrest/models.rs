use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::{
    models::{MatchPlayerEntity, PlayerStatus, Position, Team},
    roster_store::MatchFilter,
    time_format,
};

pub const MATCHES_TABLE: &str = "matches";
pub const MATCH_PLAYERS_TABLE: &str = "match_players";
pub const MATCH_RESULTS_TABLE: &str = "match_results";
pub const NOTIFICATIONS_TABLE: &str = "notifications";

pub const MATCH_ORDER: &str = "match_date.asc,start_time.asc";
pub const ROSTER_ORDER: &str = "created_at.asc";

/// Query-string pair selecting rows whose `column` equals `value`.
pub fn eq(column: &'static str, value: impl ToString) -> (&'static str, String) {
    (column, format!("eq.{}", value.to_string()))
}

/// Parenthesised, comma separated id list accepted by the `in` operator.
pub fn id_list(ids: &[Uuid]) -> String {
    let joined = ids
        .iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("({joined})")
}

/// Matches created by `player_id` or whose id is in `joined`.
pub fn involving_query(player_id: Uuid, joined: &[Uuid]) -> Vec<(&'static str, String)> {
    let mut query = vec![("select", "*".to_string()), ("order", MATCH_ORDER.to_string())];
    if joined.is_empty() {
        query.push(eq("creator_id", player_id));
    } else {
        query.push((
            "or",
            format!("(creator_id.eq.{player_id},id.in.{})", id_list(joined)),
        ));
    }
    query
}

/// Translate a [`MatchFilter`] into PostgREST horizontal filters.
pub fn match_filter_query(filter: &MatchFilter) -> Vec<(&'static str, String)> {
    let mut query = vec![("select", "*".to_string()), ("order", MATCH_ORDER.to_string())];
    if let Some(level) = filter.level {
        query.push(eq("level", level.as_str()));
    }
    if let Some(from) = filter.from_date {
        if let Ok(day) = time_format::date::format(&from) {
            query.push(("match_date", format!("gte.{day}")));
        }
    }
    if let Some(completed) = filter.completed {
        query.push(eq("is_completed", completed));
    }
    query
}

/// Columns of `match_players` that the roster is allowed to rewrite.
#[derive(Debug, Serialize)]
pub struct MatchPlayerPatch {
    pub status: PlayerStatus,
    pub team: Option<Team>,
    pub position: Option<Position>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub response_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&MatchPlayerEntity> for MatchPlayerPatch {
    fn from(row: &MatchPlayerEntity) -> Self {
        Self {
            status: row.status,
            team: row.team,
            position: row.position,
            response_at: row.response_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::dao::models::MatchLevel;

    #[test]
    fn empty_filter_only_orders() {
        let query = match_filter_query(&MatchFilter::default());
        assert_eq!(
            query,
            vec![
                ("select", "*".to_string()),
                ("order", MATCH_ORDER.to_string())
            ]
        );
    }

    #[test]
    fn populated_filter_maps_to_operators() {
        let query = match_filter_query(&MatchFilter {
            level: Some(MatchLevel::Alto),
            from_date: Some(date!(2024 - 06 - 01)),
            completed: Some(false),
        });
        assert!(query.contains(&("level", "eq.alto".to_string())));
        assert!(query.contains(&("match_date", "gte.2024-06-01".to_string())));
        assert!(query.contains(&("is_completed", "eq.false".to_string())));
    }

    #[test]
    fn involvement_combines_creator_and_memberships() {
        let player = Uuid::new_v4();
        let query = involving_query(player, &[]);
        assert!(query.contains(&("creator_id", format!("eq.{player}"))));

        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let query = involving_query(player, &[a, b]);
        assert!(query.contains(&("or", format!("(creator_id.eq.{player},id.in.({a},{b}))"))));
        assert!(!query.iter().any(|(column, _)| *column == "creator_id"));
    }
}
