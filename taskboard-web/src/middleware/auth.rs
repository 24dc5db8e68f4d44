/// Session guards
///
/// Both guards resolve the signed-in user from the cookie session (refreshing
/// an expired access token on the way) and add a [`CurrentUser`] to the
/// request extensions. They differ only in how they turn a visitor away:
///
/// - [`require_page_session`]: `303 See Other` to `/login`
/// - [`require_api_session`]: `401 Unauthorized` with a JSON error body
///
/// # Example
///
/// ```no_run
/// use axum::Extension;
/// use taskboard_web::session::CurrentUser;
///
/// async fn handler(Extension(user): Extension<CurrentUser>) -> String {
///     format!("Signed in as {}", user.email())
/// }
/// ```

use crate::{
    app::AppState,
    error::ApiError,
    session::{current_user, CurrentUser},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

/// Guard for HTML pages
pub async fn require_page_session(
    State(state): State<AppState>,
    session: Session,
    req: Request,
    next: Next,
) -> Response {
    match current_user(&state, &session).await {
        Ok(Some(user)) => run_as(user, req, next).await,
        Ok(None) => Redirect::to("/login").into_response(),
        Err(err) => err.into_response(),
    }
}

/// Guard for the JSON API
pub async fn require_api_session(
    State(state): State<AppState>,
    session: Session,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = current_user(&state, &session)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Sign in required".to_string()))?;

    Ok(run_as(user, req, next).await)
}

async fn run_as(user: CurrentUser, mut req: Request, next: Next) -> Response {
    tracing::debug!(user_id = %user.id(), "session resolved");
    req.extensions_mut().insert(user);
    next.run(req).await
}
