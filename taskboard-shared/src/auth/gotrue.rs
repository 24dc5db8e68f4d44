/// Hosted identity service client
///
/// Speaks the GoTrue REST API under `{project_url}/auth/v1/`.
///
/// # Endpoints
///
/// ```text
/// POST /auth/v1/token?grant_type=password        {email, password}
/// POST /auth/v1/token?grant_type=refresh_token   {refresh_token}
/// POST /auth/v1/signup                           {email, password}
/// POST /auth/v1/logout                           Authorization: Bearer <access token>
/// ```
///
/// Every request carries the project key in the `apikey` header. Successful
/// token grants look like:
///
/// ```json
/// {
///   "access_token": "eyJ...",
///   "token_type": "bearer",
///   "expires_in": 3600,
///   "expires_at": 1717000000,
///   "refresh_token": "v1.abc",
///   "user": { "id": "uuid", "email": "user@example.com" }
/// }
/// ```

use super::{AuthError, AuthSession, Credentials, IdentityProvider, SessionUser, SignUpOutcome};
use crate::{error::RemoteError, remote::ProjectConfig};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Response;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

/// Lifetime assumed when the service omits both `expires_at` and `expires_in`
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Error codes meaning "wrong email or password"
const INVALID_CREDENTIAL_CODES: &[&str] = &["invalid_credentials", "invalid_grant"];

/// Error codes meaning "refresh token is no good"
const INVALID_REFRESH_CODES: &[&str] = &[
    "refresh_token_not_found",
    "refresh_token_already_used",
    "session_not_found",
    "invalid_grant",
];

/// Error codes meaning "account already exists"
const ALREADY_REGISTERED_CODES: &[&str] = &["user_already_exists", "email_exists"];

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: GoTrueUser,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or_else(|| {
                now + Duration::seconds(self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS))
            });

        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: SessionUser {
                id: self.user.id,
                email: self.user.email,
            },
        }
    }
}

/// GoTrue identity client
#[derive(Debug, Clone)]
pub struct GoTrueClient {
    client: reqwest::Client,
    config: ProjectConfig,
}

impl GoTrueClient {
    /// Creates a client with a fresh HTTP client
    pub fn new(config: ProjectConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Creates a client sharing an existing HTTP client
    pub fn with_client(client: reqwest::Client, config: ProjectConfig) -> Self {
        Self { client, config }
    }

    async fn token_grant(&self, grant_type: &str, body: JsonValue) -> Result<Response, AuthError> {
        let response = self
            .client
            .post(self.config.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(RemoteError::from)?;

        Ok(response)
    }
}

/// Splits a response into its parsed body or a `RemoteError`
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(RemoteError::from_response(status.as_u16(), &body));
    }

    Ok(serde_json::from_str(&body)?)
}

fn has_code(err: &RemoteError, codes: &[&str]) -> bool {
    err.code.as_deref().is_some_and(|code| codes.contains(&code))
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    fn name(&self) -> &str {
        "gotrue"
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, AuthError> {
        let response = self
            .token_grant(
                "password",
                json!({ "email": credentials.email, "password": credentials.password }),
            )
            .await?;

        match read_json::<TokenResponse>(response).await {
            Ok(token) => {
                tracing::info!(user_id = %token.user.id, "signed in");
                Ok(token.into_session(Utc::now()))
            }
            Err(err) if has_code(&err, INVALID_CREDENTIAL_CODES) => {
                Err(AuthError::InvalidCredentials)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthError> {
        let response = self
            .client
            .post(self.config.auth_url("signup"))
            .header("apikey", &self.config.api_key)
            .json(&json!({ "email": credentials.email, "password": credentials.password }))
            .send()
            .await
            .map_err(RemoteError::from)?;

        let body = match read_json::<JsonValue>(response).await {
            Ok(body) => body,
            Err(err) if has_code(&err, ALREADY_REGISTERED_CODES) => {
                return Err(AuthError::AlreadyRegistered)
            }
            Err(err) => return Err(err.into()),
        };

        // With email confirmation enabled the service returns the bare user
        if body.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(body).map_err(RemoteError::from)?;
            tracing::info!(user_id = %token.user.id, "signed up and signed in");
            Ok(SignUpOutcome::SignedIn(token.into_session(Utc::now())))
        } else {
            tracing::info!("signed up, confirmation pending");
            Ok(SignUpOutcome::ConfirmationRequired {
                email: credentials.email.clone(),
            })
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await?;

        match read_json::<TokenResponse>(response).await {
            Ok(token) => {
                tracing::debug!(user_id = %token.user.id, "session refreshed");
                Ok(token.into_session(Utc::now()))
            }
            Err(err) if has_code(&err, INVALID_REFRESH_CODES) => {
                Err(AuthError::InvalidRefreshToken)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(self.config.auth_url("logout"))
            .header("apikey", &self.config.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(RemoteError::from)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.map_err(RemoteError::from)?;
        Err(RemoteError::from_response(status.as_u16(), &body).into())
    }
}
