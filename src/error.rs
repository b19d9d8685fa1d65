use std::io;

use thiserror::Error;

/// Errors surfaced at the harness library boundary.
///
/// HTTP and parse failures inside the two-stage adapter are logged and
/// absorbed by the answer fallbacks; these variants cover everything
/// that should actually stop a command.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("authentication failed: environment variable '{env_var}' not set")]
    AuthFailed { env_var: String },

    #[error("invalid task data in {path}: {message}")]
    InvalidTaskData { path: String, message: String },

    #[error("no task files found for {benchmark} under {dir}")]
    MissingTaskData { benchmark: String, dir: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
