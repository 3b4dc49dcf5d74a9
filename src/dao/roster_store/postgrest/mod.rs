mod config;
mod error;
mod models;
mod store;

pub use config::PostgrestConfig;
pub use error::{PostgrestDaoError, PostgrestResult};
pub use store::PostgrestRosterStore;
