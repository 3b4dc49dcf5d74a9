//! Validation helpers for DTOs.

use time::Time;
use uuid::Uuid;
use validator::ValidationError;

/// Largest invitation batch accepted in a single request.
pub const MAX_INVITATION_BATCH: usize = 32;

/// Validates that a match ends strictly after it starts.
///
/// # Examples
///
/// ```ignore
/// validate_time_window(time!(18:00), time!(19:30)) // Ok
/// validate_time_window(time!(18:00), time!(18:00)) // Err - empty window
/// validate_time_window(time!(23:00), time!(00:30)) // Err - crosses midnight
/// ```
pub fn validate_time_window(start: Time, end: Time) -> Result<(), ValidationError> {
    if end <= start {
        let mut err = ValidationError::new("time_window");
        err.message = Some("end_time must be later than start_time".into());
        return Err(err);
    }
    Ok(())
}

/// Validates the list of players to invite: non-empty, bounded and free of the nil id.
pub fn validate_player_ids(ids: &[Uuid]) -> Result<(), ValidationError> {
    if ids.is_empty() || ids.len() > MAX_INVITATION_BATCH {
        let mut err = ValidationError::new("player_ids_length");
        err.message = Some(
            format!(
                "between 1 and {MAX_INVITATION_BATCH} players must be invited (got {})",
                ids.len()
            )
            .into(),
        );
        return Err(err);
    }

    if ids.iter().any(Uuid::is_nil) {
        let mut err = ValidationError::new("player_ids_nil");
        err.message = Some("player ids must not be the nil uuid".into());
        return Err(err);
    }

    Ok(())
}
