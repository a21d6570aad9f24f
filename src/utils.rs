use axum::http::{HeaderMap, header::COOKIE};
use sha2::{Digest, Sha256};

use crate::config::SessionConfig;
use crate::session::SessionId;

/// Creates a truncated, salted hash of an identifier for safe logging.
///
/// # Arguments
/// * `id` - The identifier to hash (e.g., user name, user_id).
/// * `salt` - A salt value from the application's configuration.
///
/// # Returns
/// A short, hexadecimal string representing the salted hash.
pub fn log_safe_id(id: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(id.as_bytes());
    let hash = hasher.finalize();

    hex::encode(&hash[..4])
}

/// Finds a cookie value in the request's `Cookie` headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))
        .map(|value| value.to_string())
}

/// `Set-Cookie` value binding the browser to `id`
pub fn session_cookie(config: &SessionConfig, id: &SessionId) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.cookie_name, id, config.ttl_secs
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}
