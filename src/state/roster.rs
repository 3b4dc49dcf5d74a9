//! Decision logic for a single match roster.
//!
//! A [`Roster`] is rebuilt from the authoritative rows before every mutation. Its `plan_*`
//! methods never touch storage: they return the row to write, or the reason the mutation is
//! not allowed.

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::models::{MatchPlayerEntity, PlayerStatus, Position, Team};

/// Maximum number of confirmed players in a match.
pub const MATCH_CAPACITY: usize = 4;

/// Answer given by an invited player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationDecision {
    Accept,
    Reject,
}

/// Mutations guarded by the status of an existing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterAction {
    /// Answer an invitation.
    Respond,
    /// Move a waitlisted player into a playing slot.
    Promote,
    /// Set team and position.
    Assign,
}

impl fmt::Display for RosterAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            RosterAction::Respond => "respond to the invitation of",
            RosterAction::Promote => "promote",
            RosterAction::Assign => "assign a team to",
        };
        f.write_str(verb)
    }
}

/// Reasons a roster mutation is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("player `{player_id}` is not on the roster of match `{match_id}`")]
    NotOnRoster { match_id: Uuid, player_id: Uuid },
    #[error("player `{player_id}` already has a row in match `{match_id}`")]
    AlreadyOnRoster { match_id: Uuid, player_id: Uuid },
    #[error("cannot {action} player `{player_id}` while their status is {from:?}")]
    InvalidTransition {
        player_id: Uuid,
        from: PlayerStatus,
        action: RosterAction,
    },
    #[error("match `{match_id}` already has {} confirmed players", MATCH_CAPACITY)]
    Full { match_id: Uuid },
}

/// Outcome of filtering an invitation request against the current roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationPlan {
    /// New `invited` rows, in request order.
    pub rows: Vec<MatchPlayerEntity>,
    /// Requested players that already hold a row (or were listed twice).
    pub skipped: Vec<Uuid>,
}

/// Snapshot of every roster row of one match, keyed by player and kept in creation order.
#[derive(Debug, Clone)]
pub struct Roster {
    match_id: Uuid,
    rows: IndexMap<Uuid, MatchPlayerEntity>,
}

impl Roster {
    /// Build a roster from the rows returned by the store.
    pub fn new(match_id: Uuid, mut rows: Vec<MatchPlayerEntity>) -> Self {
        rows.sort_by_key(|row| row.created_at);
        let rows = rows
            .into_iter()
            .filter(|row| row.match_id == match_id)
            .map(|row| (row.player_id, row))
            .collect();
        Self { match_id, rows }
    }

    pub fn match_id(&self) -> Uuid {
        self.match_id
    }

    pub fn get(&self, player_id: Uuid) -> Option<&MatchPlayerEntity> {
        self.rows.get(&player_id)
    }

    pub fn contains(&self, player_id: Uuid) -> bool {
        self.rows.contains_key(&player_id)
    }

    /// Rows in creation order.
    pub fn rows(&self) -> impl Iterator<Item = &MatchPlayerEntity> {
        self.rows.values()
    }

    /// Rows currently holding `status`, in creation order.
    pub fn with_status(&self, status: PlayerStatus) -> impl Iterator<Item = &MatchPlayerEntity> {
        self.rows.values().filter(move |row| row.status == status)
    }

    pub fn confirmed_count(&self) -> usize {
        self.with_status(PlayerStatus::Confirmed).count()
    }

    pub fn is_full(&self) -> bool {
        self.confirmed_count() >= MATCH_CAPACITY
    }

    /// Status granted to a player entering the match right now.
    ///
    /// A full match waitlists the newcomer; nobody already confirmed is bumped.
    pub fn admission_status(&self) -> PlayerStatus {
        if self.is_full() {
            PlayerStatus::Waitlist
        } else {
            PlayerStatus::Confirmed
        }
    }

    /// Row to insert when `player_id` joins on their own.
    pub fn plan_join(
        &self,
        player_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<MatchPlayerEntity, RosterError> {
        if self.contains(player_id) {
            return Err(RosterError::AlreadyOnRoster {
                match_id: self.match_id,
                player_id,
            });
        }
        Ok(MatchPlayerEntity::new(
            self.match_id,
            player_id,
            self.admission_status(),
            now,
        ))
    }

    /// Invitation rows for the requested players that are not on the roster yet.
    pub fn plan_invitations(&self, candidates: &[Uuid], now: OffsetDateTime) -> InvitationPlan {
        let mut rows: Vec<MatchPlayerEntity> = Vec::with_capacity(candidates.len());
        let mut skipped = Vec::new();

        for &player_id in candidates {
            let requested_twice = rows.iter().any(|row| row.player_id == player_id);
            if self.contains(player_id) || requested_twice {
                skipped.push(player_id);
                continue;
            }
            rows.push(MatchPlayerEntity::new(
                self.match_id,
                player_id,
                PlayerStatus::Invited,
                now,
            ));
        }

        InvitationPlan { rows, skipped }
    }

    /// Updated row once `player_id` answers their invitation.
    ///
    /// Accepting into a full match queues the player on the waitlist instead of confirming.
    pub fn plan_response(
        &self,
        player_id: Uuid,
        decision: InvitationDecision,
        now: OffsetDateTime,
    ) -> Result<MatchPlayerEntity, RosterError> {
        let current = self.require_status(player_id, PlayerStatus::Invited, RosterAction::Respond)?;

        let mut row = current.clone();
        row.status = match decision {
            InvitationDecision::Accept => self.admission_status(),
            InvitationDecision::Reject => PlayerStatus::Rejected,
        };
        row.response_at = Some(now);
        row.updated_at = now;
        Ok(row)
    }

    /// Updated row moving a waitlisted player into a free slot.
    pub fn plan_promotion(
        &self,
        player_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<MatchPlayerEntity, RosterError> {
        let current = self.require_status(player_id, PlayerStatus::Waitlist, RosterAction::Promote)?;
        if self.is_full() {
            return Err(RosterError::Full {
                match_id: self.match_id,
            });
        }

        let mut row = current.clone();
        row.status = PlayerStatus::Confirmed;
        row.updated_at = now;
        Ok(row)
    }

    /// Updated row carrying a new team and position. Status is left untouched.
    pub fn plan_assignment(
        &self,
        player_id: Uuid,
        team: Option<Team>,
        position: Option<Position>,
        now: OffsetDateTime,
    ) -> Result<MatchPlayerEntity, RosterError> {
        let current = self.require_status(player_id, PlayerStatus::Confirmed, RosterAction::Assign)?;

        let mut row = current.clone();
        row.team = team;
        row.position = position;
        row.updated_at = now;
        Ok(row)
    }

    /// Record a persisted row in the snapshot.
    #[cfg(test)]
    fn apply(&mut self, row: MatchPlayerEntity) {
        if row.match_id == self.match_id {
            self.rows.insert(row.player_id, row);
        }
    }

    /// Drop a player from the snapshot, returning their last row.
    #[cfg(test)]
    fn remove(&mut self, player_id: Uuid) -> Option<MatchPlayerEntity> {
        self.rows.shift_remove(&player_id)
    }

    fn require_status(
        &self,
        player_id: Uuid,
        expected: PlayerStatus,
        action: RosterAction,
    ) -> Result<&MatchPlayerEntity, RosterError> {
        let row = self.get(player_id).ok_or(RosterError::NotOnRoster {
            match_id: self.match_id,
            player_id,
        })?;
        if row.status != expected {
            return Err(RosterError::InvalidTransition {
                player_id,
                from: row.status,
                action,
            });
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn roster_with(statuses: &[PlayerStatus]) -> (Roster, Vec<Uuid>) {
        let match_id = Uuid::new_v4();
        let mut roster = Roster::new(match_id, Vec::new());
        let players = statuses
            .iter()
            .map(|status| {
                let player_id = Uuid::new_v4();
                roster.apply(MatchPlayerEntity::new(match_id, player_id, *status, now()));
                player_id
            })
            .collect();
        (roster, players)
    }

    #[test]
    fn join_confirms_until_capacity_then_waitlists() {
        let (mut roster, _) = roster_with(&[PlayerStatus::Confirmed; 3]);

        let fourth = roster.plan_join(Uuid::new_v4(), now()).unwrap();
        assert_eq!(fourth.status, PlayerStatus::Confirmed);
        roster.apply(fourth);

        let fifth = roster.plan_join(Uuid::new_v4(), now()).unwrap();
        assert_eq!(fifth.status, PlayerStatus::Waitlist);
        assert_eq!(roster.confirmed_count(), MATCH_CAPACITY);
    }

    #[test]
    fn join_twice_is_refused() {
        let (roster, players) = roster_with(&[PlayerStatus::Rejected]);
        let err = roster.plan_join(players[0], now()).unwrap_err();
        assert_eq!(
            err,
            RosterError::AlreadyOnRoster {
                match_id: roster.match_id(),
                player_id: players[0],
            }
        );
    }

    #[test]
    fn invitations_skip_existing_and_repeated_players() {
        let (roster, players) = roster_with(&[PlayerStatus::Confirmed]);
        let newcomer = Uuid::new_v4();

        let plan = roster.plan_invitations(&[players[0], newcomer, newcomer], now());

        assert_eq!(plan.rows.len(), 1);
        assert_eq!(plan.rows[0].player_id, newcomer);
        assert_eq!(plan.rows[0].status, PlayerStatus::Invited);
        assert_eq!(plan.skipped, vec![players[0], newcomer]);
    }

    #[test]
    fn accept_confirms_and_stamps_response() {
        let (roster, players) = roster_with(&[PlayerStatus::Invited]);
        let at = now();
        let row = roster
            .plan_response(players[0], InvitationDecision::Accept, at)
            .unwrap();
        assert_eq!(row.status, PlayerStatus::Confirmed);
        assert_eq!(row.response_at, Some(at));
    }

    #[test]
    fn accept_into_full_match_waitlists() {
        let (roster, players) = roster_with(&[
            PlayerStatus::Confirmed,
            PlayerStatus::Confirmed,
            PlayerStatus::Confirmed,
            PlayerStatus::Confirmed,
            PlayerStatus::Invited,
        ]);
        let row = roster
            .plan_response(players[4], InvitationDecision::Accept, now())
            .unwrap();
        assert_eq!(row.status, PlayerStatus::Waitlist);
    }

    #[test]
    fn reject_is_terminal() {
        let (mut roster, players) = roster_with(&[PlayerStatus::Invited]);
        let row = roster
            .plan_response(players[0], InvitationDecision::Reject, now())
            .unwrap();
        assert_eq!(row.status, PlayerStatus::Rejected);
        roster.apply(row);

        let err = roster
            .plan_response(players[0], InvitationDecision::Accept, now())
            .unwrap_err();
        match err {
            RosterError::InvalidTransition { from, action, .. } => {
                assert_eq!(from, PlayerStatus::Rejected);
                assert_eq!(action, RosterAction::Respond);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn responding_without_a_row_is_not_on_roster() {
        let (roster, _) = roster_with(&[]);
        let stranger = Uuid::new_v4();
        assert!(matches!(
            roster.plan_response(stranger, InvitationDecision::Accept, now()),
            Err(RosterError::NotOnRoster { player_id, .. }) if player_id == stranger
        ));
    }

    #[test]
    fn promotion_requires_waitlist_and_free_slot() {
        let (mut roster, players) = roster_with(&[
            PlayerStatus::Confirmed,
            PlayerStatus::Confirmed,
            PlayerStatus::Confirmed,
            PlayerStatus::Confirmed,
            PlayerStatus::Waitlist,
        ]);

        assert!(matches!(
            roster.plan_promotion(players[4], now()),
            Err(RosterError::Full { .. })
        ));
        assert!(matches!(
            roster.plan_promotion(players[0], now()),
            Err(RosterError::InvalidTransition {
                from: PlayerStatus::Confirmed,
                ..
            })
        ));

        roster.remove(players[0]);
        let promoted = roster.plan_promotion(players[4], now()).unwrap();
        assert_eq!(promoted.status, PlayerStatus::Confirmed);
    }

    #[test]
    fn leaving_never_promotes_automatically() {
        let (mut roster, players) = roster_with(&[
            PlayerStatus::Confirmed,
            PlayerStatus::Confirmed,
            PlayerStatus::Confirmed,
            PlayerStatus::Confirmed,
            PlayerStatus::Waitlist,
        ]);
        roster.remove(players[1]);
        assert_eq!(roster.confirmed_count(), 3);
        assert_eq!(
            roster.get(players[4]).map(|row| row.status),
            Some(PlayerStatus::Waitlist)
        );
    }

    #[test]
    fn assignment_keeps_status() {
        let (roster, players) = roster_with(&[PlayerStatus::Confirmed, PlayerStatus::Waitlist]);
        let row = roster
            .plan_assignment(players[0], Some(Team::TeamA), Some(Position::Drive), now())
            .unwrap();
        assert_eq!(row.status, PlayerStatus::Confirmed);
        assert_eq!(row.team, Some(Team::TeamA));
        assert_eq!(row.position, Some(Position::Drive));

        assert!(roster
            .plan_assignment(players[1], Some(Team::TeamB), None, now())
            .is_err());
    }

    #[test]
    fn confirmed_count_never_exceeds_capacity() {
        let (mut roster, _) = roster_with(&[]);
        let mut invited = Vec::new();

        for round in 0..12 {
            let player_id = Uuid::new_v4();
            if round % 2 == 0 {
                roster.apply(roster.plan_join(player_id, now()).unwrap());
            } else {
                let plan = roster.plan_invitations(&[player_id], now());
                plan.rows.into_iter().for_each(|row| roster.apply(row));
                invited.push(player_id);
            }
            assert!(roster.confirmed_count() <= MATCH_CAPACITY);
        }

        for player_id in invited {
            let row = roster
                .plan_response(player_id, InvitationDecision::Accept, now())
                .unwrap();
            roster.apply(row);
            assert!(roster.confirmed_count() <= MATCH_CAPACITY);
        }
        assert_eq!(roster.confirmed_count(), MATCH_CAPACITY);
    }
}
