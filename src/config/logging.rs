// ============================================================================
// Logging Configuration
// ============================================================================

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Log raw user ids instead of salted hashes
    pub enable_user_identifiers: bool,
    pub hash_salt: String,
}

impl LoggingConfig {
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        let enable_user_identifiers = std::env::var("LOG_USER_IDENTIFIERS")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        let hash_salt = match std::env::var("LOG_HASH_SALT") {
            Ok(salt) if salt == "default-salt-please-change" => {
                anyhow::bail!("LOG_HASH_SALT must be set to a unique, secret value");
            }
            Ok(salt) if !salt.is_empty() => salt,
            _ => {
                // Hashes stay stable for the life of the process only
                tracing::warn!("LOG_HASH_SALT not set, using a per-process salt");
                uuid::Uuid::new_v4().to_string()
            }
        };

        Ok(Self {
            enable_user_identifiers,
            hash_salt,
        })
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_user_identifiers: false,
            hash_salt: uuid::Uuid::new_v4().to_string(),
        }
    }
}
