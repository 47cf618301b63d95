//! Error types for neva-core

use crate::session::SessionState;

/// Result type alias for neva-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Template contains an unknown placeholder or non-ASCII text
    #[error("Malformed template {template:?}: {reason}")]
    MalformedTemplate {
        template: String,
        reason: String,
    },
    
    /// Text that must go on the wire is not ASCII
    #[error("Not ASCII: {0:?}")]
    NotAscii(String),
    
    /// User-supplied text that would break the packet framing
    #[error("Invalid {field} {value:?}: forbidden character {found:?}")]
    InvalidField {
        field: &'static str,
        value: String,
        found: char,
    },
    
    /// Speed digit has no entry in the baud table
    #[error("Unsupported speed digit: {0}")]
    UnsupportedSpeed(u8),
    
    /// Transition not allowed from the current state
    #[error("Invalid session transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },
    
    /// Session was closed
    #[error("Session closed")]
    SessionClosed,
}
