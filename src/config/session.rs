// ============================================================================
// Session Configuration
// ============================================================================

use super::{
    DEFAULT_ANONYMOUS_SESSION_TTL_SECS, DEFAULT_SESSION_COOKIE_NAME, DEFAULT_SESSION_KEY_PREFIX,
    DEFAULT_SESSION_TTL_SECS,
};

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session id
    pub cookie_name: String,
    /// Mark the cookie `Secure` (only sent over HTTPS)
    pub cookie_secure: bool,
    /// Session lifetime in seconds; also used as the Redis TTL
    pub ttl_secs: u64,
    /// Lifetime of sessions that hold no user, only pending flash messages
    pub anonymous_ttl_secs: u64,
    /// Redis key prefix: "{prefix}{session_id}"
    pub key_prefix: String,
}

impl SessionConfig {
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        let ttl_secs = std::env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SESSION_TTL_SECS);
        if ttl_secs == 0 {
            anyhow::bail!("SESSION_TTL_SECS must be greater than zero");
        }

        let anonymous_ttl_secs = std::env::var("SESSION_ANONYMOUS_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_ANONYMOUS_SESSION_TTL_SECS)
            .min(ttl_secs);
        if anonymous_ttl_secs == 0 {
            anyhow::bail!("SESSION_ANONYMOUS_TTL_SECS must be greater than zero");
        }

        let cookie_name = std::env::var("SESSION_COOKIE_NAME")
            .unwrap_or_else(|_| DEFAULT_SESSION_COOKIE_NAME.to_string());
        if cookie_name.is_empty() || cookie_name.contains(['=', ';', ' ']) {
            anyhow::bail!("SESSION_COOKIE_NAME is not a valid cookie name: {:?}", cookie_name);
        }

        Ok(Self {
            cookie_name,
            cookie_secure: std::env::var("SESSION_COOKIE_SECURE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            ttl_secs,
            anonymous_ttl_secs,
            key_prefix: std::env::var("SESSION_KEY_PREFIX")
                .unwrap_or_else(|_| DEFAULT_SESSION_KEY_PREFIX.to_string()),
        })
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_SESSION_COOKIE_NAME.to_string(),
            cookie_secure: false,
            ttl_secs: DEFAULT_SESSION_TTL_SECS,
            anonymous_ttl_secs: DEFAULT_ANONYMOUS_SESSION_TTL_SECS,
            key_prefix: DEFAULT_SESSION_KEY_PREFIX.to_string(),
        }
    }
}
