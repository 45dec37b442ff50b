//! Authentication module for managing user sessions.
//!
//! This module provides:
//! - `Session`: Token-based session management with automatic expiry
//! - `AuthGate`: the signed-in precondition that gated queries and
//!   mutations check before touching the network
//!
//! Sessions are persisted to disk. Tokens carry their own expiry, one hour
//! unless the issuer says otherwise.

pub mod session;

pub use session::{Session, SessionData};

/// Snapshot of whether the caller is signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthGate {
    open: bool,
}

impl AuthGate {
    pub const fn open() -> Self {
        Self { open: true }
    }

    pub const fn closed() -> Self {
        Self { open: false }
    }

    pub fn from_session(session: &Session) -> Self {
        Self {
            open: session.is_valid(),
        }
    }

    /// Open only when a non-empty user id is present.
    pub fn from_user_id(user_id: Option<&str>) -> Self {
        Self {
            open: user_id.is_some_and(|id| !id.is_empty()),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_from_user_id() {
        assert!(AuthGate::from_user_id(Some("abc")).is_open());
        assert!(!AuthGate::from_user_id(Some("")).is_open());
        assert!(!AuthGate::from_user_id(None).is_open());
        assert!(!AuthGate::default().is_open());
    }
}
