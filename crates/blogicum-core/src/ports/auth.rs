//! Session and password ports.

use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::{Id, User};
use crate::policy::Viewer;

/// A verified session: who the cookie speaks for, and until when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Id,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// The viewer this session stands for, given the account currently
    /// stored under its subject. A deleted account is anonymous, and the
    /// stored username wins over the one signed into the token.
    pub fn viewer(&self, account: Option<&User>) -> Viewer {
        match account {
            Some(user) if user.id == self.user_id => Viewer::user(user.id, user.username.clone()),
            _ => Viewer::Anonymous,
        }
    }
}

/// A freshly signed token and how long the cookie carrying it should live.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub lifetime: TimeDelta,
}

/// Signs and verifies the tokens stored in the session cookie.
///
/// The username in a token is only a hint; the account is looked up by
/// the subject id on every request.
pub trait SessionTokens: Send + Sync {
    fn issue(&self, user_id: Id, username: &str) -> Result<IssuedToken, AuthError>;

    fn verify(&self, token: &str) -> Result<Session, AuthError>;
}

/// Password hashing.
pub trait PasswordService: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// `Ok(false)` is a wrong password; `Err` means the stored hash itself is bad.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;

    /// Spend the same effort as [`verify`](Self::verify) when there is no
    /// account to check against.
    fn verify_decoy(&self, password: &str);
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("session expired")]
    SessionExpired,

    #[error("malformed session token: {0}")]
    MalformedToken(String),

    #[error("failed to sign session token: {0}")]
    Signing(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("stored password hash is unusable: {0}")]
    UnusableHash(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(user_id: Id, username: &str) -> Session {
        Session {
            user_id,
            username: username.to_string(),
            expires_at: Utc::now(),
        }
    }

    fn account(id: Id, username: &str) -> User {
        let mut user = User::new(username.to_string(), String::new(), "hash".to_string());
        user.id = id;
        user
    }

    #[test]
    fn test_stored_username_wins_over_token() {
        let viewer = session(1, "alice").viewer(Some(&account(1, "alicia")));
        assert_eq!(viewer, Viewer::user(1, "alicia"));
    }

    #[test]
    fn test_deleted_account_is_anonymous() {
        assert_eq!(session(1, "alice").viewer(None), Viewer::Anonymous);
    }

    #[test]
    fn test_account_of_another_id_is_anonymous() {
        let viewer = session(1, "alice").viewer(Some(&account(2, "alice")));
        assert_eq!(viewer, Viewer::Anonymous);
    }
}
