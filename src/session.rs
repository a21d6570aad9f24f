// ============================================================================
// Server-side Sessions
// ============================================================================
//
// The browser only ever holds an opaque session id (cookie). Everything else
// lives in a SessionStore:
// - RedisSessionStore: JSON under "{prefix}{session_id}" with a TTL
// - MemorySessionStore: process-local map, used when REDIS_URL is unset
//
// Sessions without a user only carry flash messages and expire after the
// shorter anonymous TTL.
//
// ============================================================================

use anyhow::{Context, Result};
use redis::{Client, cmd};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::flash::Flash;

/// Opaque session identifier carried in the session cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a cookie value; anything that is not a session id is ignored
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Data stored server-side for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Set at login, cleared at logout
    #[serde(default)]
    pub user_id: Option<Uuid>,
    /// Flash messages waiting for the next request
    #[serde(default)]
    pub flash: Flash,
}

/// Expiry policy shared by the session stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTtl {
    pub authenticated: Duration,
    pub anonymous: Duration,
}

impl SessionTtl {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            authenticated: Duration::from_secs(config.ttl_secs),
            anonymous: Duration::from_secs(config.anonymous_ttl_secs),
        }
    }

    pub fn for_data(&self, data: &SessionData) -> Duration {
        if data.user_id.is_some() {
            self.authenticated
        } else {
            self.anonymous
        }
    }
}

impl Default for SessionTtl {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

/// Storage interface for sessions
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session; `None` when unknown or expired
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>>;

    /// Create or replace a session
    async fn save(&self, id: &SessionId, data: &SessionData) -> Result<()>;

    /// Remove a session. Removing an unknown session is not an error.
    async fn destroy(&self, id: &SessionId) -> Result<()>;

    /// Connectivity check for /health
    async fn ping(&self) -> Result<()>;
}

/// Saves `data` under a freshly generated id
pub async fn start_session(store: &dyn SessionStore, data: &SessionData) -> Result<SessionId> {
    let id = SessionId::generate();
    store.save(&id, data).await?;
    Ok(id)
}

// ============================================================================
// In-memory store
// ============================================================================

struct MemoryEntry {
    data: SessionData,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, MemoryEntry>>,
    ttl: SessionTtl,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: SessionTtl) -> Self {
        Self {
            sessions: RwLock::default(),
            ttl,
        }
    }

    /// Number of stored entries, including expired ones not yet pruned
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>> {
        let now = Instant::now();
        Ok(self
            .sessions
            .read()
            .await
            .get(id)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.data.clone()))
    }

    async fn save(&self, id: &SessionId, data: &SessionData) -> Result<()> {
        let now = Instant::now();
        let entry = MemoryEntry {
            data: data.clone(),
            expires_at: now + self.ttl.for_data(data),
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, entry| entry.is_live(now));
        sessions.insert(*id, entry);
        Ok(())
    }

    async fn destroy(&self, id: &SessionId) -> Result<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Redis store
// ============================================================================

pub struct RedisSessionStore {
    client: redis::aio::ConnectionManager,
    key_prefix: String,
    ttl: SessionTtl,
}

impl RedisSessionStore {
    pub async fn new(redis_url: &str, config: &SessionConfig) -> Result<Self> {
        if redis_url.starts_with("rediss://") {
            tracing::info!("Redis TLS enabled (rediss://)");
        }

        let client = Client::open(redis_url)
            .map_err(|e| anyhow::anyhow!("Failed to parse Redis URL: {}", e))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to Redis: {}", e))?;

        Ok(Self {
            client: conn,
            key_prefix: config.key_prefix.clone(),
            ttl: SessionTtl::from_config(config),
        })
    }

    fn key(&self, id: &SessionId) -> String {
        format!("{}{}", self.key_prefix, id)
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>> {
        let mut conn = self.client.clone();
        let raw: Option<String> = cmd("GET")
            .arg(self.key(id))
            .query_async(&mut conn)
            .await
            .context("Failed to read session from Redis")?;

        match raw {
            Some(json) => match serde_json::from_str(&json) {
                Ok(data) => Ok(Some(data)),
                Err(e) => {
                    // Unreadable payloads are treated as expired sessions
                    tracing::warn!(error = %e, "Discarding malformed session payload");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn save(&self, id: &SessionId, data: &SessionData) -> Result<()> {
        let json = serde_json::to_string(data)?;
        let mut conn = self.client.clone();
        cmd("SET")
            .arg(self.key(id))
            .arg(json)
            .arg("EX")
            .arg(self.ttl.for_data(data).as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await
            .context("Failed to write session to Redis")?;
        Ok(())
    }

    async fn destroy(&self, id: &SessionId) -> Result<()> {
        let mut conn = self.client.clone();
        cmd("DEL")
            .arg(self.key(id))
            .query_async::<_, ()>(&mut conn)
            .await
            .context("Failed to delete session from Redis")?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.client.clone();
        let _: String = cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flash::FlashKind;

    #[test]
    fn test_session_id_round_trips_through_cookie_value() {
        let id = SessionId::generate();
        assert_eq!(SessionId::parse(&id.to_string()), Some(id));
        assert_eq!(SessionId::parse("not-a-session"), None);
    }

    #[test]
    fn test_session_data_tolerates_missing_fields() {
        let data: SessionData = serde_json::from_str("{}").unwrap();
        assert_eq!(data, SessionData::default());
    }

    #[tokio::test]
    async fn test_memory_store_lifecycle() {
        let store = MemorySessionStore::new();
        let mut data = SessionData {
            user_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        data.flash.set(FlashKind::Notice, "Welcome");

        let id = start_session(&store, &data).await.unwrap();
        assert_eq!(store.load(&id).await.unwrap(), Some(data));

        store.destroy(&id).await.unwrap();
        assert_eq!(store.load(&id).await.unwrap(), None);
        // Destroying twice is fine
        store.destroy(&id).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_loads_as_none() {
        let store = MemorySessionStore::with_ttl(SessionTtl {
            authenticated: Duration::from_secs(60),
            anonymous: Duration::ZERO,
        });

        let anonymous = start_session(&store, &SessionData::default()).await.unwrap();
        assert_eq!(store.load(&anonymous).await.unwrap(), None);

        let data = SessionData {
            user_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let logged_in = start_session(&store, &data).await.unwrap();
        assert_eq!(store.load(&logged_in).await.unwrap(), Some(data));
        // Saving pruned the expired anonymous entry
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn test_anonymous_sessions_get_short_ttl() {
        let ttl = SessionTtl::default();
        let anonymous = SessionData::default();
        let logged_in = SessionData {
            user_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert!(ttl.for_data(&anonymous) < ttl.for_data(&logged_in));
        assert_eq!(ttl.for_data(&logged_in), Duration::from_secs(60 * 60 * 24 * 14));
    }
}
