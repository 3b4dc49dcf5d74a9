//! Roster projections and the payloads of the roster mutation routes.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{MatchPlayerEntity, PlayerStatus, Position, Team},
    dto::validation::validate_player_ids,
    state::{InvitationDecision, Roster},
};

/// One player's membership as exposed to clients.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct RosterEntry {
    pub player_id: Uuid,
    pub status: PlayerStatus,
    pub team: Option<Team>,
    pub position: Option<Position>,
    #[serde(with = "time::serde::rfc3339")]
    pub invitation_sent_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub response_at: Option<OffsetDateTime>,
}

impl From<&MatchPlayerEntity> for RosterEntry {
    fn from(row: &MatchPlayerEntity) -> Self {
        Self {
            player_id: row.player_id,
            status: row.status,
            team: row.team,
            position: row.position,
            invitation_sent_at: row.invitation_sent_at,
            response_at: row.response_at,
        }
    }
}

impl From<MatchPlayerEntity> for RosterEntry {
    fn from(row: MatchPlayerEntity) -> Self {
        Self::from(&row)
    }
}

/// Roster of a match split by status, each list in row creation order.
#[derive(Debug, Clone, Default, Serialize, ToSchema, PartialEq)]
pub struct RosterView {
    pub confirmed: Vec<RosterEntry>,
    pub invited: Vec<RosterEntry>,
    pub waitlist: Vec<RosterEntry>,
    pub rejected: Vec<RosterEntry>,
}

impl From<&Roster> for RosterView {
    fn from(roster: &Roster) -> Self {
        let mut view = RosterView::default();
        for row in roster.rows() {
            let bucket = match row.status {
                PlayerStatus::Confirmed => &mut view.confirmed,
                PlayerStatus::Invited => &mut view.invited,
                PlayerStatus::Waitlist => &mut view.waitlist,
                PlayerStatus::Rejected => &mut view.rejected,
            };
            bucket.push(RosterEntry::from(row));
        }
        view
    }
}

/// Players the creator wants to invite.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct InviteRequest {
    #[validate(custom(function = "validate_player_ids"))]
    pub player_ids: Vec<Uuid>,
}

/// Players that received a new invitation and those already on the roster.
#[derive(Debug, Serialize, ToSchema, PartialEq)]
pub struct InviteResponse {
    pub invited: Vec<Uuid>,
    pub skipped: Vec<Uuid>,
}

/// Answer of an invited player.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecisionDto {
    Accept,
    Reject,
}

impl From<DecisionDto> for InvitationDecision {
    fn from(value: DecisionDto) -> Self {
        match value {
            DecisionDto::Accept => InvitationDecision::Accept,
            DecisionDto::Reject => InvitationDecision::Reject,
        }
    }
}

/// Body of `POST /matches/{id}/invitation`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RespondRequest {
    pub decision: DecisionDto,
}

/// Body of `PUT /matches/{id}/players/{player_id}`. Omitted fields clear the assignment.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AssignRequest {
    #[serde(default)]
    pub team: Option<Team>,
    #[serde(default)]
    pub position: Option<Position>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn roster_view_groups_rows_by_status() {
        let match_id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let confirmed = MatchPlayerEntity::new(match_id, Uuid::new_v4(), PlayerStatus::Confirmed, now);
        let waiting = MatchPlayerEntity::new(match_id, Uuid::new_v4(), PlayerStatus::Waitlist, now);
        let invited = MatchPlayerEntity::new(match_id, Uuid::new_v4(), PlayerStatus::Invited, now);

        let roster = Roster::new(match_id, vec![confirmed.clone(), waiting.clone(), invited.clone()]);
        let view = RosterView::from(&roster);

        assert_eq!(view.confirmed, vec![RosterEntry::from(&confirmed)]);
        assert_eq!(view.waitlist, vec![RosterEntry::from(&waiting)]);
        assert_eq!(view.invited, vec![RosterEntry::from(&invited)]);
        assert!(view.rejected.is_empty());
    }

    #[test]
    fn unset_assignment_is_omitted_from_entries() {
        let row = MatchPlayerEntity::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            PlayerStatus::Invited,
            OffsetDateTime::now_utc(),
        );
        let value = serde_json::to_value(RosterEntry::from(&row)).unwrap();
        assert_eq!(value["status"], json!("invited"));
        assert!(value.get("team").is_none());
        assert!(value.get("response_at").is_none());
    }

    #[test]
    fn invite_request_rejects_empty_batches() {
        let request: InviteRequest = serde_json::from_value(json!({ "player_ids": [] })).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn decision_parses_lowercase_words() {
        let request: RespondRequest =
            serde_json::from_value(json!({ "decision": "accept" })).unwrap();
        assert_eq!(
            InvitationDecision::from(request.decision),
            InvitationDecision::Accept
        );
        assert!(serde_json::from_value::<RespondRequest>(json!({ "decision": "maybe" })).is_err());
    }
}
