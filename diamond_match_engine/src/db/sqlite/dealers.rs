use sqlx::{Row, SqliteConnection};

use crate::{db::sqlite::SqliteDatabaseError, db_types::Dealer};

pub async fn fetch_active_dealers(conn: &mut SqliteConnection) -> Result<Vec<Dealer>, SqliteDatabaseError> {
    let rows = sqlx::query(
        r#"
            SELECT telegram_id, name
            FROM dealers
            WHERE active = 1
            ORDER BY telegram_id;
        "#,
    )
    .fetch_all(conn)
    .await?;
    let dealers = rows.into_iter().map(|row| Dealer { telegram_id: row.get(0), name: row.get(1) }).collect();
    Ok(dealers)
}

/// Registers a dealer, or updates the name/active flag of an existing one. Used by operational
/// seeding tools and tests; the webhook flow itself only ever reads the directory.
pub async fn upsert_dealer(dealer: &Dealer, active: bool, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    sqlx::query(
        r#"
            INSERT INTO dealers (telegram_id, name, active)
            VALUES ($1, $2, $3)
            ON CONFLICT (telegram_id) DO UPDATE SET name = excluded.name, active = excluded.active;
        "#,
    )
    .bind(dealer.telegram_id)
    .bind(&dealer.name)
    .bind(active)
    .execute(conn)
    .await?;
    Ok(())
}
