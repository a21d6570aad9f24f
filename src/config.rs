use anyhow::Result;

mod i18n;
mod logging;
mod session;

pub use i18n::I18nConfig;
pub use logging::LoggingConfig;
pub use session::SessionConfig;

// ============================================================================
// Configuration Constants
// ============================================================================

// Default port values
const DEFAULT_PORT: u16 = 3000;

// Where unauthenticated requests are sent
pub const DEFAULT_LOGIN_URL: &str = "/login";

// Default session lifetime (in seconds)
pub const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 24 * 14;

// Lifetime of sessions without a user, which only carry flash messages
pub const DEFAULT_ANONYMOUS_SESSION_TTL_SECS: u64 = 60 * 10;

pub const DEFAULT_SESSION_COOKIE_NAME: &str = "_depot_session";
pub const DEFAULT_SESSION_KEY_PREFIX: &str = "session:";

// Supported locales when AVAILABLE_LOCALES is not set
pub const DEFAULT_AVAILABLE_LOCALES: &str = "en,es";

// Default bcrypt cost for stored password digests
pub const DEFAULT_PASSWORD_HASH_COST: u32 = bcrypt::DEFAULT_COST;

// ============================================================================
// Configuration Structures
// ============================================================================

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// Postgres connection string. When unset, users are kept in memory.
    pub database_url: Option<String>,
    /// Redis connection string. When unset, sessions are kept in memory.
    pub redis_url: Option<String>,
    /// Redirect destination for requests without a logged-in user
    pub login_url: String,
    /// Paths the authorization step lets through without a session user
    pub public_paths: Vec<String>,
    pub password_hash_cost: u32,
    /// User created at startup when missing (SEED_USER_NAME/SEED_USER_PASSWORD)
    pub seed_user: Option<SeedUser>,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
    pub i18n: I18nConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let login_url =
            std::env::var("LOGIN_URL").unwrap_or_else(|_| DEFAULT_LOGIN_URL.to_string());

        Ok(Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            database_url: std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            redis_url: std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            public_paths: default_public_paths(&login_url),
            login_url,
            password_hash_cost: std::env::var("PASSWORD_HASH_COST")
                .ok()
                .and_then(|c| c.parse().ok())
                .unwrap_or(DEFAULT_PASSWORD_HASH_COST),
            seed_user: match (
                std::env::var("SEED_USER_NAME"),
                std::env::var("SEED_USER_PASSWORD"),
            ) {
                (Ok(name), Ok(password)) if !name.is_empty() && !password.is_empty() => {
                    Some(SeedUser { name, password })
                }
                (Ok(_), Err(_)) => anyhow::bail!("SEED_USER_NAME requires SEED_USER_PASSWORD"),
                _ => None,
            },
            logging: LoggingConfig::from_env()?,
            session: SessionConfig::from_env()?,
            i18n: I18nConfig::from_env()?,
        })
    }

    /// Whether the authorization step should skip `path`
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths.iter().any(|p| p == path)
    }

    /// Path component of `login_url`, where the login page is routed
    pub fn login_path(&self) -> &str {
        url_path(&self.login_url)
    }
}

#[derive(Clone)]
pub struct SeedUser {
    pub name: String,
    pub password: String,
}

impl std::fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedUser")
            .field("name", &self.name)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let login_url = DEFAULT_LOGIN_URL.to_string();
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            redis_url: None,
            public_paths: default_public_paths(&login_url),
            login_url,
            password_hash_cost: DEFAULT_PASSWORD_HASH_COST,
            seed_user: None,
            logging: LoggingConfig::default(),
            session: SessionConfig::default(),
            i18n: I18nConfig::default(),
        }
    }
}

fn default_public_paths(login_url: &str) -> Vec<String> {
    let mut paths = vec![
        "/health".to_string(),
        "/metrics".to_string(),
        "/logout".to_string(),
    ];
    paths.push(url_path(login_url).to_string());
    paths
}

// LOGIN_URL may be absolute; only its path matters for routing and matching
fn url_path(url: &str) -> &str {
    match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or("/"),
        None => url,
    }
}
