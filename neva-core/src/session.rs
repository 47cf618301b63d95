//! Session state for the meter handshake
//!
//! ```text
//! Disconnected -> Identifying -> NegotiatingSpeed -> Authenticating -> Ready
//!       \______________\_______________\__________________\____________\__> Closed
//! ```
//!
//! Progression is forward-only. `Closed` is reachable from every state and
//! is terminal.

use std::fmt;

use tracing::debug;

use crate::error::{Error, Result};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionState {
    /// Created, link not used yet
    Disconnected,

    /// Identification request sent
    Identifying,

    /// Switching to the meter's announced speed
    NegotiatingSpeed,

    /// Sending the password
    Authenticating,

    /// Authenticated, registers can be read
    Ready,

    /// Link torn down
    Closed,
}

impl SessionState {
    /// The state `connect` moves to next, if any
    pub fn next(self) -> Option<SessionState> {
        match self {
            Self::Disconnected => Some(Self::Identifying),
            Self::Identifying => Some(Self::NegotiatingSpeed),
            Self::NegotiatingSpeed => Some(Self::Authenticating),
            Self::Authenticating => Some(Self::Ready),
            Self::Ready | Self::Closed => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Identifying => "identifying",
            Self::NegotiatingSpeed => "negotiating speed",
            Self::Authenticating => "authenticating",
            Self::Ready => "ready",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Session state tracker
///
/// State changes only through [`Session::advance`] and [`Session::close`].
#[derive(Debug)]
pub struct Session {
    state: SessionState,
}

impl Session {
    /// Create a new disconnected session
    pub fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
        }
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if registers can be read
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Check if closed
    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// Move to the next handshake state
    ///
    /// Only the single forward step from the current state is accepted.
    pub fn advance(&mut self, to: SessionState) -> Result<()> {
        if self.state == SessionState::Closed {
            return Err(Error::SessionClosed);
        }

        if self.state.next() != Some(to) {
            return Err(Error::InvalidTransition {
                from: self.state,
                to,
            });
        }

        debug!(from = %self.state, to = %to, "Session transition");
        self.state = to;
        Ok(())
    }

    /// Close session; returns `false` if it was already closed
    pub fn close(&mut self) -> bool {
        if self.is_closed() {
            return false;
        }
        debug!(from = %self.state, "Session closed");
        self.state = SessionState::Closed;
        true
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_session() -> Session {
        let mut session = Session::new();
        session.advance(SessionState::Identifying).unwrap();
        session.advance(SessionState::NegotiatingSpeed).unwrap();
        session.advance(SessionState::Authenticating).unwrap();
        session.advance(SessionState::Ready).unwrap();
        session
    }

    #[test]
    fn test_session_new() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(!session.is_ready());
        assert!(!session.is_closed());
    }

    #[test]
    fn test_full_handshake() {
        let session = ready_session();
        assert!(session.is_ready());
    }

    #[test]
    fn test_cannot_skip_states() {
        let mut session = Session::new();
        let result = session.advance(SessionState::Ready);

        assert!(matches!(
            result,
            Err(Error::InvalidTransition {
                from: SessionState::Disconnected,
                to: SessionState::Ready
            })
        ));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_cannot_go_back() {
        let mut session = ready_session();
        assert!(session.advance(SessionState::Disconnected).is_err());
        assert!(session.advance(SessionState::Identifying).is_err());
    }

    #[test]
    fn test_close_is_terminal() {
        let mut session = ready_session();

        assert!(session.close());
        assert!(!session.close());
        assert!(session.is_closed());

        assert!(matches!(
            session.advance(SessionState::Identifying),
            Err(Error::SessionClosed)
        ));
    }

    #[test]
    fn test_close_mid_handshake() {
        let mut session = Session::new();
        session.advance(SessionState::Identifying).unwrap();

        assert!(session.close());
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn test_next() {
        assert_eq!(SessionState::Authenticating.next(), Some(SessionState::Ready));
        assert_eq!(SessionState::Ready.next(), None);
        assert_eq!(SessionState::Closed.next(), None);
    }
}
