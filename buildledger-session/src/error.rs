//! Session error types

use thiserror::Error;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Session management errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Auth backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Invalid response from auth backend: {0}")]
    InvalidResponse(String),

    #[error("No active session")]
    NoSession,

    #[error("Session supervisor has stopped")]
    SupervisorStopped,

    #[error("Invalid session configuration: {0}")]
    Config(String),
}

impl SessionError {
    /// Whether the backend rejected the credentials themselves
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Backend { status, .. } if *status == 401 || *status == 403)
    }

    /// Whether a token exchange was refused; GoTrue answers a bad or reused
    /// refresh token with 400 `invalid_grant`
    pub fn is_rejected(&self) -> bool {
        self.is_unauthorized() || matches!(self, Self::Backend { status: 400, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(status: u16) -> SessionError {
        SessionError::Backend {
            status,
            message: "nope".to_string(),
        }
    }

    #[test]
    fn test_rejection_statuses() {
        assert!(backend(400).is_rejected());
        assert!(backend(401).is_rejected());
        assert!(backend(403).is_rejected());
        assert!(!backend(400).is_unauthorized());
        assert!(!backend(500).is_rejected());
        assert!(!backend(503).is_rejected());
        assert!(!SessionError::NoSession.is_rejected());
    }
}
