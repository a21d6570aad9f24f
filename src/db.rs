use anyhow::{Context, Result};
use bcrypt::{hash, verify};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

pub type DbPool = Pool<Postgres>;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    #[serde(skip)]
    pub password_digest: String,
}

impl User {
    /// Builds a user with a freshly hashed password
    pub fn new(name: &str, password: &str, cost: u32) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            password_digest: hash(password, cost).context("Failed to hash password")?,
        })
    }

    pub fn authenticate(&self, password: &str) -> bool {
        verify(password, &self.password_digest).unwrap_or(false)
    }
}

pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Keyed access to the user collection
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>>;

    async fn find_by_name(&self, name: &str) -> Result<Option<User>>;

    async fn create(&self, user: &User) -> Result<()>;

    /// Connectivity check for /health
    async fn ping(&self) -> Result<()>;
}

// ============================================================================
// PostgreSQL
// ============================================================================

pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, password_digest)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.password_digest)
        .execute(&self.pool)
        .await
        .context("Failed to insert user")?;
        Ok(())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, password_digest
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, password_digest
            FROM users
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn remove(&self, id: &Uuid) -> Option<User> {
        self.users.write().await.remove(id)
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.name == name)
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.name == user.name) {
            anyhow::bail!("User name already taken: {}", user.name);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
