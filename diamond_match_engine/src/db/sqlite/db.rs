use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use crate::{
    db::sqlite::{cta_clicks, dealers, new_pool, notifications, SqliteDatabaseError},
    db_types::{Dealer, NewCtaClick, NewNotification},
    traits::{
        CtaTracking,
        CtaTrackingError,
        DealerDirectory,
        DealerDirectoryError,
        NotificationError,
        NotificationManagement,
    },
};

/// The tables this gateway owns. Created on connect so a fresh deployment needs no separate
/// migration step. `idempotency_key` is nullable: rows without one never collide, which is how
/// duplicate-on-redelivery stays the default.
const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS dealers (
        telegram_id INTEGER PRIMARY KEY,
        name        TEXT,
        active      INTEGER NOT NULL DEFAULT 1,
        created_at  TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS notifications (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        telegram_id     INTEGER NOT NULL,
        message_type    TEXT NOT NULL,
        message_content TEXT NOT NULL,
        metadata        TEXT NOT NULL DEFAULT '{}',
        status          TEXT NOT NULL DEFAULT 'pending',
        idempotency_key TEXT UNIQUE,
        created_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cta_clicks (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        telegram_id INTEGER NOT NULL,
        parameter   TEXT NOT NULL,
        first_name  TEXT,
        username    TEXT,
        clicked_at  TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
    "#,
];

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        let db = Self { url: url.to_string(), pool };
        db.create_schema().await?;
        Ok(db)
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_schema(&self) -> Result<(), SqliteDatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("🗃️ Store schema is in place");
        Ok(())
    }

    pub async fn upsert_dealer(&self, dealer: &Dealer, active: bool) -> Result<(), SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        dealers::upsert_dealer(dealer, active, &mut conn).await
    }

    pub async fn count_notifications(&self, telegram_id: i64) -> Result<i64, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        notifications::count_notifications_for(telegram_id, &mut conn).await
    }
}

impl DealerDirectory for SqliteDatabase {
    async fn fetch_active_dealers(&self) -> Result<Vec<Dealer>, DealerDirectoryError> {
        let mut conn = self.pool.acquire().await.map_err(|e| DealerDirectoryError::DatabaseError(e.to_string()))?;
        dealers::fetch_active_dealers(&mut conn).await.map_err(|e| DealerDirectoryError::DatabaseError(e.to_string()))
    }
}

impl NotificationManagement for SqliteDatabase {
    async fn insert_notification(&self, notification: NewNotification) -> Result<i64, NotificationError> {
        let mut conn = self.pool.acquire().await.map_err(|e| NotificationError::DatabaseError(e.to_string()))?;
        match notifications::insert_notification(notification, &mut conn).await {
            Ok(id) => Ok(id),
            Err(SqliteDatabaseError::DuplicateNotification(key)) => Err(NotificationError::Duplicate(key)),
            Err(e) => Err(NotificationError::DatabaseError(e.to_string())),
        }
    }
}

impl CtaTracking for SqliteDatabase {
    async fn record_cta_click(&self, click: NewCtaClick) -> Result<i64, CtaTrackingError> {
        let mut conn = self.pool.acquire().await.map_err(|e| CtaTrackingError::DatabaseError(e.to_string()))?;
        cta_clicks::insert_cta_click(click, &mut conn).await.map_err(|e| CtaTrackingError::DatabaseError(e.to_string()))
    }
}
