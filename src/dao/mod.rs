/// Roster persistence abstraction and its backends.
pub mod roster_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
/// Serde helpers for the textual date/time columns.
pub mod time_format;
