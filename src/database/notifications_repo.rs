use sqlx::{Executor, Sqlite};

pub struct NewNotification<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub title: &'a str,
    pub message: &'a str,
    pub kind: &'a str,
    pub prescription_id: Option<&'a str>,
    pub data: Option<String>,
}

const SQL_INSERT_NOTIFICATION: &str = r#"
INSERT INTO notifications (
  id, user_id, title, message, type, prescription_id, data
) VALUES (?, ?, ?, ?, ?, ?, ?)
"#;

pub async fn insert_notification<'e, E>(
    executor: E,
    notification: NewNotification<'_>,
) -> sqlx::Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(SQL_INSERT_NOTIFICATION)
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.title)
        .bind(notification.message)
        .bind(notification.kind)
        .bind(notification.prescription_id)
        .bind(notification.data)
        .execute(executor)
        .await?;
    Ok(())
}
