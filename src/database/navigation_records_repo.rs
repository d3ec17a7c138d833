use sqlx::{Executor, Sqlite};

pub struct NewNavigationRecord<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub pharmacy_id: &'a str,
    pub prescription_id: &'a str,
}

const SQL_INSERT_NAVIGATION_RECORD: &str = r#"
INSERT INTO navigation_records (
  id, user_id, pharmacy_id, prescription_id
) VALUES (?, ?, ?, ?)
"#;

pub async fn insert_navigation_record<'e, E>(
    executor: E,
    record: NewNavigationRecord<'_>,
) -> sqlx::Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(SQL_INSERT_NAVIGATION_RECORD)
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.pharmacy_id)
        .bind(record.prescription_id)
        .execute(executor)
        .await?;
    Ok(())
}
