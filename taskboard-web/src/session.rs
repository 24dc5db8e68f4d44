/// Browser sessions
///
/// A signed-in browser session stores two things in its cookie-backed
/// `tower_sessions::Session`:
///
/// - the identity session ([`AuthSession`]: tokens, expiry, user)
/// - a client id naming this session's [`Database`] in the [`ClientRegistry`]
///
/// Each browser session owns exactly one `Database`, and with it one read
/// cache. It is created at sign-in and dropped at sign-out or after the idle
/// timeout, so one user's cached rows are never served to another. The
/// client is scoped to the signed-in user: its updates and deletes only
/// reach that user's tasks.
///
/// # Token Refresh
///
/// [`current_user`] refreshes an expired access token before handing the
/// session out. If the refresh fails the browser session is flushed and the
/// request proceeds as signed out.
///
/// # Flash Messages
///
/// Form handlers redirect after every POST. Outcomes that the next page
/// should show travel as a one-shot [`Flash`] stored in the session.

use crate::{app::AppState, config::DEFAULT_SESSION_IDLE, error::ApiResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use taskboard_shared::{auth::AuthSession, Database};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tower_sessions::Session;
use uuid::Uuid;

/// Session key of the identity session
pub const AUTH_KEY: &str = "auth";

/// Session key of the data client id
pub const CLIENT_KEY: &str = "client_id";

/// Session key of the pending flash message
pub const FLASH_KEY: &str = "flash";

/// Per-session data clients
///
/// Entries are keyed by the client id stored in the browser session. A
/// session abandoned without a logout leaves its entry behind; entries not
/// used for `idle_timeout` are evicted on the next registration and by
/// [`ClientRegistry::evict_idle`], which `main` runs periodically. The idle
/// timeout matches the session cookie's inactivity expiry.
#[derive(Debug)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<Uuid, Client>>,
    idle_timeout: Duration,
}

#[derive(Debug)]
struct Client {
    db: Arc<Database>,
    last_seen: Instant,
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientRegistry {
    /// Creates an empty registry with the default idle timeout
    pub fn new() -> Self {
        Self::with_idle_timeout(DEFAULT_SESSION_IDLE)
    }

    /// Creates an empty registry evicting clients idle for `idle_timeout`
    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Inactivity after which a client is evicted
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Registers a client under a fresh id, evicting idle ones first
    pub async fn register(&self, db: Database) -> (Uuid, Arc<Database>) {
        let id = Uuid::new_v4();
        let db = Arc::new(db);

        let mut clients = self.clients.write().await;
        let evicted = Self::retain_active(&mut clients, self.idle_timeout);
        if evicted > 0 {
            tracing::debug!(evicted, "idle data clients evicted");
        }

        clients.insert(
            id,
            Client {
                db: db.clone(),
                last_seen: Instant::now(),
            },
        );
        (id, db)
    }

    /// Looks up a client and marks it as used
    pub async fn get(&self, id: Uuid) -> Option<Arc<Database>> {
        let mut clients = self.clients.write().await;
        let client = clients.get_mut(&id)?;
        client.last_seen = Instant::now();
        Some(client.db.clone())
    }

    /// Drops a client and its cache
    pub async fn remove(&self, id: Uuid) -> bool {
        self.clients.write().await.remove(&id).is_some()
    }

    /// Drops every client unused for the idle timeout; returns how many
    pub async fn evict_idle(&self) -> usize {
        let mut clients = self.clients.write().await;
        Self::retain_active(&mut clients, self.idle_timeout)
    }

    /// Number of live clients
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Whether no client is live
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn retain_active(clients: &mut HashMap<Uuid, Client>, idle_timeout: Duration) -> usize {
        let before = clients.len();
        clients.retain(|_, client| client.last_seen.elapsed() < idle_timeout);
        before - clients.len()
    }
}

/// Signed-in user of the current request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Identity session (tokens already fresh)
    pub auth: AuthSession,

    /// Data client owned by this browser session
    pub db: Arc<Database>,
}

impl CurrentUser {
    /// User id (task owner)
    pub fn id(&self) -> Uuid {
        self.auth.user.id
    }

    /// User email, or empty
    pub fn email(&self) -> &str {
        self.auth.email()
    }
}

/// Kind of a flash message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    /// Something worked
    Success,

    /// Something failed
    Error,
}

/// One-shot message shown on the next page render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    /// Kind
    pub kind: FlashKind,

    /// Text
    pub message: String,
}

impl Flash {
    /// Success message
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    /// Error message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

/// Stores a flash message for the next render
pub async fn set_flash(session: &Session, flash: Flash) -> ApiResult<()> {
    session.insert(FLASH_KEY, flash).await?;
    Ok(())
}

/// Removes and returns the pending flash message
pub async fn take_flash(session: &Session) -> ApiResult<Option<Flash>> {
    Ok(session.remove::<Flash>(FLASH_KEY).await?)
}

/// Starts a signed-in browser session
///
/// Rotates the session id, stores the identity session and creates the
/// session's data client.
pub async fn start(state: &AppState, session: &Session, auth: AuthSession) -> ApiResult<()> {
    // A previous sign-in in the same browser leaves a client behind
    if let Some(old) = session.get::<Uuid>(CLIENT_KEY).await? {
        state.clients.remove(old).await;
    }

    session.cycle_id().await?;

    let (client_id, _) = state.clients.register(data_client(state, &auth)).await;

    tracing::info!(user_id = %auth.user.id, %client_id, "session started");

    session.insert(AUTH_KEY, &auth).await?;
    session.insert(CLIENT_KEY, client_id).await?;
    Ok(())
}

/// Data client acting as the session's user
fn data_client(state: &AppState, auth: &AuthSession) -> Database {
    Database::with_access_token(state.store.clone(), auth.access_token.clone())
        .with_owner(auth.user.id)
}

/// Ends the browser session
///
/// Drops the data client and flushes the cookie session. Returns the identity
/// session that was active, if any, so the caller can revoke it.
pub async fn end(state: &AppState, session: &Session) -> ApiResult<Option<AuthSession>> {
    let auth = session.get::<AuthSession>(AUTH_KEY).await?;

    if let Some(client_id) = session.get::<Uuid>(CLIENT_KEY).await? {
        if let Some(db) = state.clients.get(client_id).await {
            db.cache().invalidate_all().await;
        }
        state.clients.remove(client_id).await;
        tracing::info!(%client_id, "session ended");
    }

    session.flush().await?;
    Ok(auth)
}

/// Resolves the signed-in user of this request
///
/// Returns `None` when nobody is signed in, or when the access token expired
/// and could not be refreshed.
pub async fn current_user(state: &AppState, session: &Session) -> ApiResult<Option<CurrentUser>> {
    let Some(mut auth) = session.get::<AuthSession>(AUTH_KEY).await? else {
        return Ok(None);
    };

    if auth.is_expired() {
        match state.identity.refresh(&auth.refresh_token).await {
            Ok(fresh) => {
                tracing::debug!(user_id = %fresh.user.id, "access token refreshed");
                auth = fresh;
                session.insert(AUTH_KEY, &auth).await?;
            }
            Err(err) => {
                tracing::info!(user_id = %auth.user.id, "refresh failed, signing out: {}", err);
                end(state, session).await?;
                return Ok(None);
            }
        }
    }

    let db = match session.get::<Uuid>(CLIENT_KEY).await? {
        Some(client_id) => state.clients.get(client_id).await,
        None => None,
    };

    let db = match db {
        Some(db) => db,
        None => {
            // Client lost, e.g. evicted while idle
            let (client_id, db) = state.clients.register(data_client(state, &auth)).await;
            session.insert(CLIENT_KEY, client_id).await?;
            db
        }
    };

    db.set_access_token(Some(auth.access_token.clone())).await;

    Ok(Some(CurrentUser { auth, db }))
}
