#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PrescriptionsRow {
    pub id: String,
    pub user_id: String,
    pub image_url: Option<String>,
    pub status: String,
}
