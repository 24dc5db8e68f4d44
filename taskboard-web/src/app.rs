/// Application state and router builder
///
/// This module defines the shared application state and provides a function
/// to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskboard_web::{app::{build_router, AppState}, config::Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::from_config(config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::{BackendConfig, Config},
    middleware::{
        auth::{require_api_session, require_page_session},
        security::SecurityHeadersLayer,
    },
    session::ClientRegistry,
};
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use taskboard_shared::{
    auth::{gotrue::GoTrueClient, memory::MemoryIdentity, IdentityProvider},
    remote::{MemoryStore, PostgrestStore, TableStore},
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore as SessionStore, SessionManagerLayer};
use tracing::Level;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "taskboard.sid";

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,

    /// Table transport shared by every session's data client
    pub store: Arc<dyn TableStore>,

    /// Identity service
    pub identity: Arc<dyn IdentityProvider>,

    /// Data clients of signed-in sessions
    pub clients: Arc<ClientRegistry>,
}

impl AppState {
    /// Creates state from explicit collaborators
    pub fn new(
        config: Config,
        store: Arc<dyn TableStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let clients = ClientRegistry::with_idle_timeout(config.server.session_idle);

        Self {
            config: Arc::new(config),
            store,
            identity,
            clients: Arc::new(clients),
        }
    }

    /// Creates state with the collaborators named by the configuration
    pub fn from_config(config: Config) -> Self {
        let (store, identity): (Arc<dyn TableStore>, Arc<dyn IdentityProvider>) =
            match &config.backend {
                BackendConfig::Remote(project) => (
                    Arc::new(PostgrestStore::new(project.clone())),
                    Arc::new(GoTrueClient::new(project.clone())),
                ),
                BackendConfig::Offline => {
                    (Arc::new(MemoryStore::new()), Arc::new(MemoryIdentity::new()))
                }
            };

        tracing::info!(
            backend = config.backend.label(),
            store = store.name(),
            identity = identity.name(),
            "collaborators ready"
        );

        Self::new(config, store, identity)
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                 # Health check (public)
/// ├── GET  /login                  # Login page (redirects home when signed in)
/// ├── POST /login                  # Password sign-in
/// ├── POST /signup                 # Account creation
/// ├── POST /logout                 # Sign-out
/// ├── GET  /                       # Dashboard (session required)
/// ├── POST /tasks                  # Create task from form
/// ├── GET  /tasks/:id/edit         # Dashboard with edit form
/// ├── POST /tasks/:id              # Update task from form
/// ├── POST /tasks/:id/delete       # Delete task
/// └── /v1/                         # JSON API (session required)
///     ├── GET/POST     /tasks
///     ├── PATCH/DELETE /tasks/:id
///     ├── GET/POST     /user-data
///     └── PATCH/DELETE /user-data/:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. Cookie sessions (tower-sessions)
/// 3. Security headers
/// 4. Session guards (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Public pages and health
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/login",
            get(routes::auth::login_page).post(routes::auth::login),
        )
        .route("/signup", post(routes::auth::signup))
        .route("/logout", post(routes::auth::logout));

    // Dashboard and task forms (redirect to /login without a session)
    let page_routes = Router::new()
        .route("/", get(routes::tasks::dashboard))
        .route("/tasks", post(routes::tasks::create_task))
        .route("/tasks/:id/edit", get(routes::tasks::edit_task))
        .route("/tasks/:id", post(routes::tasks::update_task))
        .route("/tasks/:id/delete", post(routes::tasks::delete_task))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_page_session,
        ));

    // JSON API (401 without a session)
    let api_routes = Router::new()
        .route(
            "/tasks",
            get(routes::api::list_tasks).post(routes::api::create_task),
        )
        .route(
            "/tasks/:id",
            patch(routes::api::update_task).delete(routes::api::delete_task),
        )
        .route(
            "/user-data",
            get(routes::api::list_user_data).post(routes::api::create_user_data),
        )
        .route(
            "/user-data/:id",
            patch(routes::api::update_user_data).delete(routes::api::delete_user_data),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_api_session,
        ));

    // Same inactivity limit as the data client registry
    let expiry = match state.config.server.session_idle.try_into() {
        Ok(idle) => Expiry::OnInactivity(idle),
        Err(_) => Expiry::OnSessionEnd,
    };

    let session_layer = SessionManagerLayer::new(SessionStore::default())
        .with_name(SESSION_COOKIE)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_secure(state.config.server.production)
        .with_expiry(expiry);

    Router::new()
        .merge(public_routes)
        .merge(page_routes)
        .nest("/v1", api_routes)
        .layer(SecurityHeadersLayer::new(state.config.server.production))
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
