use chrono::{NaiveDate, NaiveDateTime, TimeDelta, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, Time};
use utoipa::ToSchema;
use uuid::Uuid;

use super::time_format;

/// Roster status of a player inside a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// Invited by the creator, awaiting an answer.
    Invited,
    /// Holds one of the four playing slots.
    Confirmed,
    /// Declined the invitation.
    Rejected,
    /// Queued behind a full match.
    Waitlist,
}

impl PlayerStatus {
    /// Column value used by the relational store.
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerStatus::Invited => "invited",
            PlayerStatus::Confirmed => "confirmed",
            PlayerStatus::Rejected => "rejected",
            PlayerStatus::Waitlist => "waitlist",
        }
    }
}

/// Side of the court a confirmed player is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    TeamA,
    TeamB,
}

/// Playing position inside a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Drive,
    Reves,
}

/// Skill level advertised for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchLevel {
    Clasico,
    Alto,
    Medio,
    Bajo,
}

impl MatchLevel {
    /// Column value used by the relational store.
    pub fn as_str(self) -> &'static str {
        match self {
            MatchLevel::Clasico => "clasico",
            MatchLevel::Alto => "alto",
            MatchLevel::Medio => "medio",
            MatchLevel::Bajo => "bajo",
        }
    }
}

/// Notification category written by the roster into the `notifications` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    MatchInvitation,
}

/// Row of the `matches` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchEntity {
    /// Primary key of the match.
    pub id: Uuid,
    /// User who created the match and owns its management rights.
    pub creator_id: Uuid,
    /// Court the match is played on, when one was booked.
    pub court_id: Option<Uuid>,
    /// Calendar day of the match.
    #[serde(with = "time_format::date")]
    pub match_date: Date,
    #[serde(with = "time_format::time_of_day")]
    pub start_time: Time,
    #[serde(with = "time_format::time_of_day")]
    pub end_time: Time,
    pub level: MatchLevel,
    pub price_per_player: Option<f64>,
    pub notes: Option<String>,
    /// Flipped once a result has been registered.
    pub is_completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl MatchEntity {
    /// Instant the match ends, reading the wall-clock columns in `zone`.
    ///
    /// A repeated hour resolves to its later occurrence; a skipped hour is pushed forward by
    /// the size of the gap.
    pub fn ends_at(&self, zone: Tz) -> Option<OffsetDateTime> {
        let local = local_date_time(self.match_date, self.end_time)?;
        let zoned = zone.from_local_datetime(&local).latest().or_else(|| {
            let shifted = local.checked_add_signed(TimeDelta::try_hours(1)?)?;
            zone.from_local_datetime(&shifted).latest()
        })?;
        let nanos = i128::from(zoned.timestamp()) * 1_000_000_000
            + i128::from(zoned.timestamp_subsec_nanos());
        OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
    }

    /// Whether the match end time lies strictly before `now`.
    pub fn is_past(&self, now: OffsetDateTime, zone: Tz) -> bool {
        self.ends_at(zone).is_some_and(|end| end < now)
    }
}

fn local_date_time(date: Date, at: Time) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(
        date.year(),
        u32::from(u8::from(date.month())),
        u32::from(date.day()),
    )?
    .and_hms_opt(
        u32::from(at.hour()),
        u32::from(at.minute()),
        u32::from(at.second()),
    )
}

/// Row of the `match_players` table: one player's membership in one match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchPlayerEntity {
    pub id: Uuid,
    pub match_id: Uuid,
    pub player_id: Uuid,
    pub status: PlayerStatus,
    pub team: Option<Team>,
    pub position: Option<Position>,
    #[serde(with = "time::serde::rfc3339")]
    pub invitation_sent_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub response_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl MatchPlayerEntity {
    /// Fresh roster row for `player_id` with the given initial status.
    pub fn new(match_id: Uuid, player_id: Uuid, status: PlayerStatus, now: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            match_id,
            player_id,
            status,
            team: None,
            position: None,
            invitation_sent_at: now,
            response_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Row of the `match_results` table. At most one per match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchResultEntity {
    pub id: Uuid,
    pub match_id: Uuid,
    pub team_a_score: i32,
    pub team_b_score: i32,
    /// User who entered the result.
    pub recorded_by: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Row of the `notifications` table. Written once, never read back by the roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_id: Option<Uuid>,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime, time};

    use super::*;

    fn sample_match() -> MatchEntity {
        let now = datetime!(2024-05-01 12:00 UTC);
        MatchEntity {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            court_id: None,
            match_date: date!(2024 - 05 - 17),
            start_time: time!(18:00),
            end_time: time!(19:30),
            level: MatchLevel::Medio,
            price_per_player: Some(6.5),
            notes: None,
            is_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn end_time_follows_summer_time() {
        let entity = sample_match();
        assert_eq!(
            entity.ends_at(chrono_tz::Europe::Madrid),
            Some(datetime!(2024-05-17 17:30 UTC))
        );
        assert!(entity.is_past(datetime!(2024-05-17 17:31 UTC), chrono_tz::Europe::Madrid));
        assert!(!entity.is_past(datetime!(2024-05-17 17:31 UTC), chrono_tz::UTC));
    }

    #[test]
    fn winter_match_is_still_running_an_hour_before_its_end() {
        let mut entity = sample_match();
        entity.match_date = date!(2025 - 01 - 15);
        entity.start_time = time!(10:00);
        entity.end_time = time!(11:30);

        assert_eq!(
            entity.ends_at(chrono_tz::Europe::Madrid),
            Some(datetime!(2025-01-15 10:30 UTC))
        );
        assert!(!entity.is_past(datetime!(2025-01-15 10:00 UTC), chrono_tz::Europe::Madrid));
        assert!(entity.is_past(datetime!(2025-01-15 10:31 UTC), chrono_tz::Europe::Madrid));
    }

    #[test]
    fn clock_change_hours_resolve_to_a_single_instant() {
        let mut entity = sample_match();
        // 02:30 does not exist in Madrid on 2025-03-30.
        entity.match_date = date!(2025 - 03 - 30);
        entity.end_time = time!(2:30);
        assert_eq!(
            entity.ends_at(chrono_tz::Europe::Madrid),
            Some(datetime!(2025-03-30 01:30 UTC))
        );

        // 02:30 happens twice on 2025-10-26; the later one counts.
        entity.match_date = date!(2025 - 10 - 26);
        assert_eq!(
            entity.ends_at(chrono_tz::Europe::Madrid),
            Some(datetime!(2025-10-26 01:30 UTC))
        );
    }

    #[test]
    fn match_row_uses_store_column_encoding() {
        let entity = sample_match();
        let value = serde_json::to_value(&entity).unwrap();
        assert_eq!(value["match_date"], "2024-05-17");
        assert_eq!(value["start_time"], "18:00");
        assert_eq!(value["level"], "medio");

        let mut row = value.clone();
        row["end_time"] = "19:30:00".into();
        let parsed: MatchEntity = serde_json::from_value(row).unwrap();
        assert_eq!(parsed, entity);
    }

    #[test]
    fn roster_row_enums_match_column_values() {
        let mut row = MatchPlayerEntity::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            PlayerStatus::Waitlist,
            datetime!(2024-05-01 12:00 UTC),
        );
        row.team = Some(Team::TeamB);
        row.position = Some(Position::Reves);
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["status"], "waitlist");
        assert_eq!(value["team"], "team_b");
        assert_eq!(value["position"], "reves");
        assert!(value["response_at"].is_null());
    }
}
