/// Identity collaborator
///
/// This module provides the identity side of Taskboard: signing users in and
/// out and keeping their access tokens fresh.
///
/// # Modules
///
/// - [`gotrue`]: client for the hosted identity service
/// - [`memory`]: in-process identity store for offline mode and tests
/// - [`password`]: Argon2id hashing used by the in-process store
///
/// # Sessions
///
/// A sign-in yields an [`AuthSession`]: an access token for table calls, a
/// refresh token, the expiry instant and the signed-in user. Sessions within
/// [`EXPIRY_MARGIN_SECS`] of expiring count as expired so a request never
/// starts with a token that dies mid-flight.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::{Credentials, IdentityProvider, gotrue::GoTrueClient};
/// use taskboard_shared::remote::ProjectConfig;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let identity = GoTrueClient::new(ProjectConfig::new("https://project.supabase.co", "anon-key"));
///
/// let session = identity
///     .sign_in(&Credentials::new("user@example.com", "hunter22"))
///     .await?;
/// println!("Signed in as {}", session.email());
/// # Ok(())
/// # }
/// ```

pub mod gotrue;
pub mod memory;
pub mod password;

use crate::error::RemoteError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Seconds before expiry at which a session is refreshed
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Identity errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Email/password pair rejected
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// Sign-up for an email that already has an account
    #[error("User already registered")]
    AlreadyRegistered,

    /// Refresh token unknown, used or revoked
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// Any other backend failure
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Local password hashing failure
    #[error(transparent)]
    Password(#[from] password::PasswordError),
}

/// Email/password pair submitted by the login form
#[derive(Clone, Deserialize, Validate)]
pub struct Credentials {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl Credentials {
    /// Creates credentials, trimming the email
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            password: password.to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Signed-in user as reported by the identity service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// User id (owner reference for tasks)
    pub id: Uuid,

    /// Email address
    #[serde(default)]
    pub email: Option<String>,
}

/// Active identity session
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Bearer token for table calls
    pub access_token: String,

    /// Token exchanged for a new session
    pub refresh_token: String,

    /// When `access_token` stops being accepted
    pub expires_at: DateTime<Utc>,

    /// Signed-in user
    pub user: SessionUser,
}

impl AuthSession {
    /// Whether the access token is expired or about to be
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expiry check against an explicit instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now + Duration::seconds(EXPIRY_MARGIN_SECS)
    }

    /// Email of the signed-in user, or empty
    pub fn email(&self) -> &str {
        self.user.email.as_deref().unwrap_or("")
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("user", &self.user)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Result of a sign-up
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// Account created and signed in
    SignedIn(AuthSession),

    /// Account created; the user must confirm their email first
    ConfirmationRequired {
        /// Address the confirmation was sent to
        email: String,
    },
}

/// Identity service contract
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short provider name for logs and health output
    fn name(&self) -> &str;

    /// Signs in with email and password
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, AuthError>;

    /// Creates an account
    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError>;

    /// Exchanges a refresh token for a new session
    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError>;

    /// Revokes the session owning `access_token`
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: DateTime<Utc>) -> AuthSession {
        AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at,
            user: SessionUser {
                id: Uuid::new_v4(),
                email: Some("user@example.com".to_string()),
            },
        }
    }

    #[test]
    fn test_session_expiry_margin() {
        let now = Utc::now();

        assert!(!session(now + Duration::hours(1)).is_expired_at(now));
        assert!(session(now + Duration::seconds(30)).is_expired_at(now));
        assert!(session(now - Duration::seconds(1)).is_expired_at(now));
    }

    #[test]
    fn test_session_debug_hides_tokens() {
        let debug = format!("{:?}", session(Utc::now()));
        assert!(!debug.contains("access"));
        assert!(debug.contains("user@example.com"));
    }

    #[test]
    fn test_credentials_validation() {
        assert!(Credentials::new(" user@example.com ", "secret1").validate().is_ok());
        assert!(Credentials::new("not-an-email", "secret1").validate().is_err());
        assert!(Credentials::new("user@example.com", "123").validate().is_err());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let debug = format!("{:?}", Credentials::new("a@b.co", "topsecret"));
        assert!(!debug.contains("topsecret"));
    }
}
