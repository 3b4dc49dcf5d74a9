/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Match records, projections and results.
pub mod match_service;
/// Invitation, membership and waitlist operations on a match roster.
pub mod roster_service;
/// Roster store connection supervisor with degraded mode handling.
pub mod storage_supervisor;

#[cfg(test)]
mod testing;
