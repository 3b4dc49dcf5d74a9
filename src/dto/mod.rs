/// Health payloads.
pub mod health;
/// Match records, list filters and results.
pub mod matches;
/// Roster projections and roster mutation payloads.
pub mod roster;
/// Validation helpers shared by the request payloads.
pub mod validation;
