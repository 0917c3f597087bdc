use sqlx::{Row, SqliteConnection};

use crate::{db::sqlite::SqliteDatabaseError, db_types::NewCtaClick};

pub async fn insert_cta_click(click: NewCtaClick, conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let row = sqlx::query(
        r#"
            INSERT INTO cta_clicks (telegram_id, parameter, first_name, username)
            VALUES ($1, $2, $3, $4)
            RETURNING id;
        "#,
    )
    .bind(click.telegram_id)
    .bind(&click.parameter)
    .bind(&click.first_name)
    .bind(&click.username)
    .fetch_one(conn)
    .await?;
    Ok(row.get(0))
}
