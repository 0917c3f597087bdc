use log::debug;
use sqlx::{Row, SqliteConnection};

use crate::{
    db::sqlite::errors::{is_unique_violation, SqliteDatabaseError},
    db_types::NewNotification,
};

/// Inserts a single notification row and returns its id. Not atomic with anything else: the
/// dispatcher inserts one row per dealer and each insert stands alone.
pub async fn insert_notification(
    notification: NewNotification,
    conn: &mut SqliteConnection,
) -> Result<i64, SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
            INSERT INTO notifications (
                telegram_id,
                message_type,
                message_content,
                metadata,
                status,
                idempotency_key
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id;
        "#,
    )
    .bind(notification.telegram_id)
    .bind(notification.message_type.to_string())
    .bind(&notification.message_content)
    .bind(notification.metadata.to_string())
    .bind(notification.status.to_string())
    .bind(&notification.idempotency_key)
    .fetch_one(conn)
    .await;
    match result {
        Ok(row) => {
            let id: i64 = row.get(0);
            debug!("🗃️ Notification #{id} saved for dealer {}", notification.telegram_id);
            Ok(id)
        },
        Err(e) if is_unique_violation(&e) => {
            Err(SqliteDatabaseError::DuplicateNotification(notification.idempotency_key.unwrap_or_default()))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn count_notifications_for(telegram_id: i64, conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let row = sqlx::query("SELECT COUNT(*) FROM notifications WHERE telegram_id = $1;")
        .bind(telegram_id)
        .fetch_one(conn)
        .await?;
    Ok(row.get(0))
}
