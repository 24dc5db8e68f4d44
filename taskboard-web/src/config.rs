/// Configuration management for the web server
///
/// This module loads configuration from environment variables once at
/// startup and provides a type-safe configuration struct. There is no
/// runtime reconfiguration.
///
/// # Environment Variables
///
/// - `SUPABASE_PROJECT_URL`: Backend endpoint (required unless offline)
/// - `SUPABASE_API_KEY`: Backend anon key (required unless offline)
/// - `TASKBOARD_OFFLINE`: Use in-memory tables and accounts (default: false)
/// - `APP_HOST`: Host to bind to (default: 0.0.0.0)
/// - `APP_PORT`: Port to bind to (default: 8080)
/// - `APP_PRODUCTION`: Enable HSTS and secure cookies (default: false)
/// - `SESSION_IDLE_MINUTES`: Inactivity before a browser session and its data
///   client are dropped (default: 1440)
/// - `RUST_LOG`: Log filter (read by the tracing subscriber, not here)
///
/// # Example
///
/// ```no_run
/// use taskboard_web::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::time::Duration;
use taskboard_shared::remote::ProjectConfig;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Where tables and accounts live
    pub backend: BackendConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Production mode (HSTS header, `Secure` session cookie)
    pub production: bool,

    /// Inactivity after which a browser session expires
    pub session_idle: Duration,
}

/// Default session inactivity limit (one day)
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(24 * 60 * 60);

/// Backend selection
#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// Hosted project (PostgREST tables + GoTrue identity)
    Remote(ProjectConfig),

    /// In-process tables and accounts, lost on restart
    Offline,
}

impl BackendConfig {
    /// Short label for logs and health output
    pub fn label(&self) -> &'static str {
        match self {
            BackendConfig::Remote(_) => "remote",
            BackendConfig::Offline => "offline",
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// A `.env` file in the working directory is loaded first when present.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The backend URL or key is missing outside offline mode
    /// - A numeric or boolean variable has an invalid value
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("APP_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("APP_PORT must be a port number: {}", e))?,
            None => 8080,
        };
        let production = parse_flag("APP_PRODUCTION", lookup("APP_PRODUCTION"))?;
        let session_idle = match lookup("SESSION_IDLE_MINUTES") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(minutes) if minutes > 0 => Duration::from_secs(minutes.saturating_mul(60)),
                _ => anyhow::bail!("SESSION_IDLE_MINUTES must be a positive number, got {:?}", raw),
            },
            None => DEFAULT_SESSION_IDLE,
        };

        let backend = if parse_flag("TASKBOARD_OFFLINE", lookup("TASKBOARD_OFFLINE"))? {
            BackendConfig::Offline
        } else {
            let project_url = required(&lookup, "SUPABASE_PROJECT_URL")?;
            let api_key = required(&lookup, "SUPABASE_API_KEY")?;

            if !project_url.starts_with("http://") && !project_url.starts_with("https://") {
                anyhow::bail!("SUPABASE_PROJECT_URL must start with http:// or https://");
            }

            BackendConfig::Remote(ProjectConfig::new(project_url, api_key))
        };

        Ok(Self {
            server: ServerConfig {
                host,
                port,
                production,
                session_idle,
            },
            backend,
        })
    }

    /// Offline configuration for local runs and tests
    pub fn offline() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                production: false,
                session_idle: DEFAULT_SESSION_IDLE,
            },
            backend: BackendConfig::Offline,
        }
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn required<F>(lookup: &F, key: &str) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
}

fn parse_flag(key: &str, value: Option<String>) -> anyhow::Result<bool> {
    let Some(value) = value else {
        return Ok(false);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{} must be a boolean, got {:?}", key, other),
    }
}
