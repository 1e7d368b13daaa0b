use thiserror::Error;

use crate::auth::{Role, RoleRequirement};

/// Every way session resolution can fail. Callers never distinguish between these
/// for access decisions: any of them means "no session".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no active session")]
    NoSession,
    #[error("token rejected: {0}")]
    InvalidToken(String),
    #[error("token expired")]
    Expired,
    #[error("no profile for the authenticated user")]
    UnknownProfile,
    #[error("profile carries an unknown role `{0}`")]
    UnknownRole(String),
    #[error("session resolution timed out")]
    Timeout,
    #[error("session provider failure: {0}")]
    Provider(String),
}

/// Why a gated page refused to render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateDenial {
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] SessionError),
    #[error("role `{role}` does not satisfy {requirement}")]
    InsufficientRole {
        role: Role,
        requirement: RoleRequirement,
    },
}
