//! Error types for the match orchestration service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific match lifecycle scenarios
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("operation '{operation}' is not allowed in stage {stage}")]
    IllegalTransition { stage: String, operation: String },

    #[error("unknown {kind}: {id}")]
    UnknownEntity { kind: String, id: String },

    #[error("match is closed (stage {stage})")]
    MatchClosed { stage: String },

    #[error("plugin disabled: {reason}")]
    PluginDisabled { reason: String },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("internal service error: {message}")]
    Internal { message: String },
}

impl MatchError {
    pub fn illegal(stage: impl std::fmt::Display, operation: impl Into<String>) -> Self {
        MatchError::IllegalTransition {
            stage: stage.to_string(),
            operation: operation.into(),
        }
    }

    pub fn unknown(kind: impl Into<String>, id: impl Into<String>) -> Self {
        MatchError::UnknownEntity {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn closed(stage: impl std::fmt::Display) -> Self {
        MatchError::MatchClosed {
            stage: stage.to_string(),
        }
    }
}

/// Benign error signals from the input-gating layer.
///
/// All of these are swallowed by the arbiter: a prompt may legitimately
/// outlive its handler, a callback may veto a user, and a message may already
/// be gone by the time a resolution lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("interaction not allowed")]
    NotAllowed,

    #[error("user lacking permission")]
    LackingPermission,

    #[error("message not found")]
    NotFound,

    #[error("interaction invalid")]
    Invalid,
}
