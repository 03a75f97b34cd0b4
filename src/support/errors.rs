//! Single crate-wide error taxonomy.
//!
//! Every layer — dispatcher handlers, the command layer, the repositories,
//! and the HTTP admin surface — returns `CsmsError`. The variants are
//! exactly the error kinds a protocol response or an operator call can
//! produce; there is no separate domain/infra split, since the taxonomy is
//! small and doesn't grow independently per layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsmsError {
    #[error("charger not found: {0}")]
    ChargerNotFound(String),

    #[error("charger not connected: {0}")]
    ChargerNotConnected(String),

    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("concurrent transaction on charger {0}")]
    ConcurrentTx(String),

    #[error("timeout waiting for response")]
    Timeout,

    #[error("authorization failed for idTag {0}")]
    AuthorizationFailed(String),

    #[error("transient failure: {0}")]
    Transient(String),
}

impl From<sea_orm::DbErr> for CsmsError {
    fn from(e: sea_orm::DbErr) -> Self {
        CsmsError::Transient(e.to_string())
    }
}

impl CsmsError {
    /// Stable code surfaced at the admin/HTTP boundary.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ChargerNotFound(_) => "ChargerNotFound",
            Self::ChargerNotConnected(_) => "ChargerNotConnected",
            Self::ProtocolViolation(_) => "ProtocolViolation",
            Self::UnknownAction(_) => "UnknownAction",
            Self::ConcurrentTx(_) => "ConcurrentTx",
            Self::Timeout => "Timeout",
            Self::AuthorizationFailed(_) => "AuthorizationFailed",
            Self::Transient(_) => "Transient",
        }
    }

    /// HTTP status the admin surface maps this error kind to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ChargerNotFound(_) => 404,
            Self::ChargerNotConnected(_) => 409,
            Self::ProtocolViolation(_) => 400,
            Self::UnknownAction(_) => 400,
            Self::ConcurrentTx(_) => 409,
            Self::Timeout => 504,
            Self::AuthorizationFailed(_) => 401,
            Self::Transient(_) => 503,
        }
    }
}

pub type CsmsResult<T> = Result<T, CsmsError>;
