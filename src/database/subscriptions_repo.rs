use sqlx::{sqlite::SqliteArguments, Arguments, SqlitePool};

use crate::models::SubscriptionsRow;

const SQL_LIST_FOR_PHARMACIES_BASE: &str = r#"
SELECT
    id, pharmacy_id, status, start_date, end_date
FROM subscriptions
WHERE pharmacy_id IN
"#;

/// Every subscription (any status) of the given pharmacies.
pub async fn list_for_pharmacies(
    pool: &SqlitePool,
    pharmacy_ids: &[&str],
) -> sqlx::Result<Vec<SubscriptionsRow>> {
    if pharmacy_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut sql = String::from(SQL_LIST_FOR_PHARMACIES_BASE);
    let mut args = SqliteArguments::default();
    let placeholders = vec!["?"; pharmacy_ids.len()].join(", ");
    sql.push_str(&format!(" ({})", placeholders));
    for id in pharmacy_ids {
        args.add(*id);
    }
    sql.push_str(" ORDER BY pharmacy_id, end_date DESC");

    sqlx::query_as_with::<_, SubscriptionsRow, _>(&sql, args)
        .fetch_all(pool)
        .await
}
