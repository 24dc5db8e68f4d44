/// In-process identity store
///
/// Keeps accounts and sessions in memory and mimics the hosted identity
/// service closely enough for offline mode and tests:
///
/// - emails are matched case-insensitively
/// - passwords are stored as Argon2id hashes, computed on the blocking pool
///   without holding the account lock
/// - refresh tokens are single-use (rotated on every refresh)
/// - signing out revokes the access token and its refresh token
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::{Credentials, IdentityProvider, SignUpOutcome};
/// use taskboard_shared::auth::memory::MemoryIdentity;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let identity = MemoryIdentity::new();
/// let credentials = Credentials::new("user@example.com", "hunter22");
///
/// let SignUpOutcome::SignedIn(session) = identity.sign_up(&credentials).await? else {
///     unreachable!("auto-confirm is on by default")
/// };
/// assert_eq!(session.email(), "user@example.com");
/// # Ok(())
/// # }
/// ```

use super::{
    password::{hash_password, verify_password, PasswordError},
    AuthError, AuthSession, Credentials, IdentityProvider, SessionUser, SignUpOutcome,
};
use crate::error::RemoteError;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Account {
    id: Uuid,
    email: String,
    password_hash: String,
    confirmed: bool,
}

#[derive(Debug, Default)]
struct State {
    /// Keyed by lowercase email
    accounts: HashMap<String, Account>,

    /// access token → (user id, refresh token)
    access_tokens: HashMap<String, (Uuid, String)>,

    /// refresh token → user id
    refresh_tokens: HashMap<String, Uuid>,
}

/// Identity provider keeping accounts in memory
#[derive(Debug)]
pub struct MemoryIdentity {
    state: Mutex<State>,
    token_ttl: Duration,
    auto_confirm: bool,
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentity {
    /// Creates a store issuing one-hour sessions with auto-confirmed sign-ups
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            token_ttl: Duration::hours(1),
            auto_confirm: true,
        }
    }

    /// Sets the lifetime of issued access tokens
    pub fn with_token_ttl(mut self, token_ttl: Duration) -> Self {
        self.token_ttl = token_ttl;
        self
    }

    /// Requires email confirmation before sign-in
    pub fn require_confirmation(mut self) -> Self {
        self.auto_confirm = false;
        self
    }

    /// Marks an account as confirmed
    pub async fn confirm(&self, email: &str) -> bool {
        let mut state = self.state.lock().await;
        match state.accounts.get_mut(&email.to_lowercase()) {
            Some(account) => {
                account.confirmed = true;
                true
            }
            None => false,
        }
    }

    /// Number of live access tokens
    pub async fn active_sessions(&self) -> usize {
        self.state.lock().await.access_tokens.len()
    }

    fn issue(&self, state: &mut State, account: &Account) -> AuthSession {
        let access_token = format!("mem-access-{}", Uuid::new_v4().simple());
        let refresh_token = format!("mem-refresh-{}", Uuid::new_v4().simple());

        state
            .access_tokens
            .insert(access_token.clone(), (account.id, refresh_token.clone()));
        state.refresh_tokens.insert(refresh_token.clone(), account.id);

        AuthSession {
            access_token,
            refresh_token,
            expires_at: Utc::now() + self.token_ttl,
            user: SessionUser {
                id: account.id,
                email: Some(account.email.clone()),
            },
        }
    }
}

/// Runs Argon2 work on the blocking pool
async fn blocking<T, F>(work: F) -> Result<T, AuthError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PasswordError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| RemoteError::new(format!("Password worker failed: {}", e)))?;
    Ok(result?)
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    fn name(&self) -> &str {
        "memory"
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, AuthError> {
        let account = self
            .state
            .lock()
            .await
            .accounts
            .get(&credentials.email.to_lowercase())
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;

        let password = credentials.password.clone();
        let hash = account.password_hash.clone();
        if !blocking(move || verify_password(&password, &hash)).await? {
            return Err(AuthError::InvalidCredentials);
        }

        if !account.confirmed {
            return Err(RemoteError::new("Email not confirmed")
                .with_status(400)
                .with_code("email_not_confirmed")
                .into());
        }

        let mut state = self.state.lock().await;
        Ok(self.issue(&mut state, &account))
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError> {
        let key = credentials.email.to_lowercase();
        let password = credentials.password.clone();
        let password_hash = blocking(move || hash_password(&password)).await?;

        let mut state = self.state.lock().await;
        if state.accounts.contains_key(&key) {
            return Err(AuthError::AlreadyRegistered);
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: credentials.email.clone(),
            password_hash,
            confirmed: self.auto_confirm,
        };
        state.accounts.insert(key, account.clone());

        if account.confirmed {
            Ok(SignUpOutcome::SignedIn(self.issue(&mut state, &account)))
        } else {
            Ok(SignUpOutcome::ConfirmationRequired {
                email: account.email,
            })
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let mut state = self.state.lock().await;

        let user_id = state
            .refresh_tokens
            .remove(refresh_token)
            .ok_or(AuthError::InvalidRefreshToken)?;

        // Retire the access token paired with the used refresh token
        state
            .access_tokens
            .retain(|_, (_, paired)| paired.as_str() != refresh_token);

        let account = state
            .accounts
            .values()
            .find(|a| a.id == user_id)
            .cloned()
            .ok_or(AuthError::InvalidRefreshToken)?;

        Ok(self.issue(&mut state, &account))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let mut state = self.state.lock().await;

        match state.access_tokens.remove(access_token) {
            Some((_, refresh_token)) => {
                state.refresh_tokens.remove(&refresh_token);
                Ok(())
            }
            None => Err(RemoteError::new("Invalid JWT").with_status(401).into()),
        }
    }
}
