use sqlx::{Executor, Sqlite, SqlitePool};

use crate::models::PrescriptionsRow;

const SQL_LOAD_PRESCRIPTION: &str = r#"
SELECT id, user_id, image_url, status
FROM prescriptions
WHERE id = ?1
"#;

const SQL_UPDATE_PRESCRIPTION_STATUS: &str = r#"
UPDATE prescriptions
SET status = ?
WHERE id = ?
"#;

pub async fn load_prescription(
    pool: &SqlitePool,
    prescription_id: &str,
) -> sqlx::Result<Option<PrescriptionsRow>> {
    sqlx::query_as::<_, PrescriptionsRow>(SQL_LOAD_PRESCRIPTION)
        .bind(prescription_id)
        .fetch_optional(pool)
        .await
}

pub async fn update_prescription_status<'e, E>(
    executor: E,
    prescription_id: &str,
    status: &str,
) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(SQL_UPDATE_PRESCRIPTION_STATUS)
        .bind(status)
        .bind(prescription_id)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}
