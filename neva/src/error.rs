//! High-level error types

use neva_core::SessionState;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that stop the current operation
///
/// Degraded readings are not errors; they are reported as
/// [`Advisory`](crate::Advisory) values inside an [`Outcome`](crate::Outcome).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] neva_core::Error),
    
    #[error("Transport error: {0}")]
    Transport(#[from] neva_transport::Error),
    
    #[error("Type error: {0}")]
    Types(#[from] neva_types::Error),
    
    #[error("Malformed identification reply {reply:?}: {reason}")]
    MalformedIdentification {
        reply: String,
        reason: String,
    },
    
    #[error("Authentication failed after {attempts} attempts")]
    AuthenticationExhausted {
        attempts: u32,
    },
    
    #[error("Address not found: {0}")]
    AddressNotFound(String),
    
    #[error("Alias is not a range: {0}")]
    NotARange(String),
    
    #[error("Session closed")]
    SessionClosed,
    
    #[error("Meter not ready (state: {0})")]
    NotReady(SessionState),
    
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Check if the session can no longer be used and must be rebuilt
    pub fn requires_reconnect(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::MalformedIdentification { .. }
                | Self::AuthenticationExhausted { .. }
                | Self::SessionClosed
                | Self::Core(neva_core::Error::SessionClosed)
        )
    }
    
    /// Check if the session is closed
    pub fn is_session_closed(&self) -> bool {
        matches!(
            self,
            Self::SessionClosed | Self::Core(neva_core::Error::SessionClosed)
        )
    }
}
