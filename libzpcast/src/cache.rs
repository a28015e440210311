//! Single-slot cache of the last published post
//!
//! Every store fully replaces the previous record. There is no history.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::SqlitePool;
use std::path::Path;
use tokio::sync::RwLock;

use crate::error::CacheError;
use crate::types::FormattedPost;

pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// The cached post and when it was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPost {
    pub post: FormattedPost,
    pub stored_at: DateTime<Utc>,
}

#[async_trait]
pub trait PostCache: Send + Sync {
    /// Replace the slot with `post`
    async fn store(&self, post: &FormattedPost) -> CacheResult<()>;

    /// The current slot contents, if anything has been stored
    async fn load(&self) -> CacheResult<Option<CachedPost>>;
}

/// In-process slot, lost on restart
#[derive(Debug, Default)]
pub struct MemoryCache {
    slot: RwLock<Option<CachedPost>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostCache for MemoryCache {
    async fn store(&self, post: &FormattedPost) -> CacheResult<()> {
        *self.slot.write().await = Some(CachedPost {
            post: post.clone(),
            stored_at: Utc::now(),
        });
        Ok(())
    }

    async fn load(&self) -> CacheResult<Option<CachedPost>> {
        Ok(self.slot.read().await.clone())
    }
}

/// SQLite-backed slot, survives restarts
#[derive(Clone)]
pub struct SqliteCache {
    pool: SqlitePool,
}

impl SqliteCache {
    /// Open (or create) the cache database and run migrations
    pub async fn new(db_path: &str) -> CacheResult<Self> {
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Forward slashes work for SQLite URLs on every platform; mode=rwc creates the file
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));
        let pool = SqlitePool::connect(&db_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl PostCache for SqliteCache {
    async fn store(&self, post: &FormattedPost) -> CacheResult<()> {
        let payload = serde_json::to_string(post)?;

        sqlx::query(
            r#"
            INSERT INTO last_post (slot, payload, stored_at)
            VALUES (0, ?, ?)
            ON CONFLICT(slot) DO UPDATE SET payload = excluded.payload, stored_at = excluded.stored_at
            "#,
        )
        .bind(payload)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load(&self) -> CacheResult<Option<CachedPost>> {
        use sqlx::Row;

        let row = sqlx::query("SELECT payload, stored_at FROM last_post WHERE slot = 0")
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload: String = row.get("payload");
        let stored_at: i64 = row.get("stored_at");

        Ok(Some(CachedPost {
            post: serde_json::from_str(&payload)?,
            stored_at: Utc
                .timestamp_millis_opt(stored_at)
                .single()
                .unwrap_or_else(Utc::now),
        }))
    }
}
