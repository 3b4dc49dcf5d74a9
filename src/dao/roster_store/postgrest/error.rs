//! Error types shared by the PostgREST storage implementation.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`PostgrestDaoError`] failures.
pub type PostgrestResult<T> = Result<T, PostgrestDaoError>;

/// Failures that can occur while talking to the PostgREST gateway.
#[derive(Debug, Error)]
pub enum PostgrestDaoError {
    /// Required environment variable is missing.
    #[error("missing PostgREST environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build PostgREST client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request to a table endpoint could not be sent.
    #[error("failed to send PostgREST request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The gateway returned an unexpected status code.
    #[error("unexpected PostgREST response status {status} for `{path}`: {body}")]
    RequestStatus {
        path: String,
        status: StatusCode,
        body: String,
    },
    /// The write violated a unique or foreign key constraint (HTTP 409).
    #[error("PostgREST rejected write to `{path}`: {body}")]
    Conflict { path: String, body: String },
    /// A filtered update matched no row.
    #[error("no row of `{path}` matched the update filter")]
    RowNotFound { path: String },
    /// Response payload could not be parsed into the expected rows.
    #[error("failed to decode PostgREST response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

impl From<PostgrestDaoError> for StorageError {
    fn from(err: PostgrestDaoError) -> Self {
        match err {
            PostgrestDaoError::Conflict { path, body } => {
                StorageError::conflict(format!("{path}: {body}"))
            }
            PostgrestDaoError::RowNotFound { path } => StorageError::not_found(path),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
