/// Authentication pages
///
/// # Endpoints
///
/// - `GET /login` - Login page (redirects to `/` when signed in)
/// - `POST /login` - Password sign-in
/// - `POST /signup` - Account creation
/// - `POST /logout` - Sign-out
///
/// Every POST answers with `303 See Other`. Failures travel to the login
/// page as a flash message.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    session::{self, Flash},
    views,
};
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use taskboard_shared::auth::{Credentials, SignUpOutcome};
use tower_sessions::Session;
use validator::Validate;

/// Login and sign-up form
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    /// Email address
    #[serde(default)]
    pub email: String,

    /// Password
    #[serde(default)]
    pub password: String,
}

impl CredentialsForm {
    fn into_credentials(self) -> Result<Credentials, ApiError> {
        let credentials = Credentials::new(&self.email, &self.password);
        credentials.validate()?;
        Ok(credentials)
    }
}

/// Renders the login page
pub async fn login_page(State(state): State<AppState>, session: Session) -> ApiResult<Response> {
    if session::current_user(&state, &session).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let flash = session::take_flash(&session).await?;
    Ok(Html(views::login::render(flash.as_ref())).into_response())
}

/// Signs in with email and password
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> ApiResult<Redirect> {
    let result = match form.into_credentials() {
        Ok(credentials) => state
            .identity
            .sign_in(&credentials)
            .await
            .map_err(ApiError::from),
        Err(err) => Err(err),
    };

    match result {
        Ok(auth) => {
            session::start(&state, &session, auth).await?;
            Ok(Redirect::to("/"))
        }
        Err(err) => {
            tracing::info!("Sign-in rejected: {}", err);
            session::set_flash(&session, Flash::error(err.user_message())).await?;
            Ok(Redirect::to("/login"))
        }
    }
}

/// Creates an account
///
/// Signs the new user in when the backend returns a session right away,
/// otherwise shows a "check your email" page.
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> ApiResult<Response> {
    let result = match form.into_credentials() {
        Ok(credentials) => state
            .identity
            .sign_up(&credentials)
            .await
            .map_err(ApiError::from),
        Err(err) => Err(err),
    };

    match result {
        Ok(SignUpOutcome::SignedIn(auth)) => {
            session::start(&state, &session, auth).await?;
            session::set_flash(&session, Flash::success("Account created")).await?;
            Ok(Redirect::to("/").into_response())
        }
        Ok(SignUpOutcome::ConfirmationRequired { email }) => {
            Ok(Html(views::login::confirmation_sent(&email)).into_response())
        }
        Err(err) => {
            tracing::info!("Sign-up rejected: {}", err);
            session::set_flash(&session, Flash::error(err.user_message())).await?;
            Ok(Redirect::to("/login").into_response())
        }
    }
}

/// Signs out and drops the session's data client
pub async fn logout(State(state): State<AppState>, session: Session) -> ApiResult<Redirect> {
    if let Some(auth) = session::end(&state, &session).await? {
        // The local session is gone either way
        if let Err(err) = state.identity.sign_out(&auth.access_token).await {
            tracing::warn!(user_id = %auth.user.id, "Remote sign-out failed: {}", err);
        }
    }

    Ok(Redirect::to("/login"))
}
