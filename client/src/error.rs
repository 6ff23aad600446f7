//! Unified error handling for the client runtime.

use crate::config::ConfigError;
use std::fmt;

/// The half of a sync round that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Pull,
    Push,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::Pull => write!(f, "pull"),
            SyncPhase::Push => write!(f, "push"),
        }
    }
}

/// Client error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Credentials were rejected. Terminal; show it to the user.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The server could not be reached or failed. Retryable.
    #[error("transport error: {0}")]
    Transport(String),

    /// A local-store invariant would be violated.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A sync round was abandoned. Nothing from the failed phase was kept.
    #[error("sync aborted during {phase}: {source}")]
    SyncAbort {
        phase: SyncPhase,
        #[source]
        source: Box<Error>,
    },

    /// The server answered with something we cannot decode.
    #[error("malformed response: {0}")]
    Protocol(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("session restore still in progress")]
    SessionRestoring,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Wrap `source` as the reason a round was abandoned.
    pub fn sync_abort(phase: SyncPhase, source: Error) -> Self {
        Error::SyncAbort {
            phase,
            source: Box::new(source),
        }
    }

    /// Whether trying the same thing again later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::SyncAbort { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

impl From<rentx_engine::Error> for Error {
    fn from(err: rentx_engine::Error) -> Self {
        use rentx_engine::Error as Engine;

        match &err {
            Engine::UserAlreadyExists(_) => Error::Conflict(err.to_string()),
            Engine::UserNotFound(_) => Error::NotFound(err.to_string()),
            _ => Error::InvalidData(err.to_string()),
        }
    }
}

/// Result type alias for the client runtime.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_into_taxonomy() {
        let err: Error = rentx_engine::Error::UserAlreadyExists("local-1".into()).into();
        assert!(matches!(err, Error::Conflict(_)));

        let err: Error = rentx_engine::Error::UserNotFound("local-1".into()).into();
        assert!(matches!(err, Error::NotFound(_)));

        let err: Error = rentx_engine::Error::CursorRegression {
            current: 4,
            received: 2,
        }
        .into();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn retryability() {
        assert!(Error::Transport("timeout".into()).is_retryable());
        assert!(!Error::Authentication("bad password".into()).is_retryable());

        let abort = Error::sync_abort(SyncPhase::Pull, Error::Transport("reset".into()));
        assert!(abort.is_retryable());

        let abort = Error::sync_abort(SyncPhase::Pull, Error::Protocol("not json".into()));
        assert!(!abort.is_retryable());
    }

    #[test]
    fn sync_abort_display_names_phase() {
        let err = Error::sync_abort(SyncPhase::Push, Error::Transport("refused".into()));
        assert_eq!(
            err.to_string(),
            "sync aborted during push: transport error: refused"
        );
    }
}
