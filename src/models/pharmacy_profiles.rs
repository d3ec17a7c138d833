// Row shape for candidate discovery; coordinates stay optional until validated.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PharmacyProfilesRow {
    pub id: String,
    pub pharmacy_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub is_verified: bool,
}
