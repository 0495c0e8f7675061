//! Caller-held view of the login session.
//!
//! The server's cookie session is authoritative. `SessionStatus` is only what
//! the last login or logout call reported; the client never stores it and
//! never consults it before sending a request.

use crate::types::{LoginResponse, MessageResponse, User};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Anonymous,
    Authenticated { user: User, is_admin: bool },
}

impl SessionStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionStatus::Authenticated { user, .. } => Some(user),
            SessionStatus::Anonymous => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, SessionStatus::Authenticated { is_admin: true, .. })
    }
}

/// Result of a login or logout call: the server's message and the session
/// status the call implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub message: String,
    pub session: SessionStatus,
}

impl From<LoginResponse> for AuthOutcome {
    fn from(response: LoginResponse) -> Self {
        Self {
            message: response.message,
            session: SessionStatus::Authenticated {
                user: response.user,
                is_admin: response.is_admin,
            },
        }
    }
}

impl From<MessageResponse> for AuthOutcome {
    fn from(response: MessageResponse) -> Self {
        Self {
            message: response.message,
            session: SessionStatus::Anonymous,
        }
    }
}
