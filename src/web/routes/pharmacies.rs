use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;

use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::routes::parse_requester;
use crate::web::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyPharmaciesBody {
    pub user_latitude: Option<f64>,
    pub user_longitude: Option<f64>,
    pub min_distance_km: Option<f64>,
    pub max_distance_km: Option<f64>,
}

pub async fn nearby_pharmacies_handler(
    Extension(_auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Json(body): Json<NearbyPharmaciesBody>,
) -> Response {
    let requester = match parse_requester(body.user_latitude, body.user_longitude) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let window = state
        .locator
        .settings
        .window(body.min_distance_km, body.max_distance_km);
    let result = state.locator.find_nearby(&state.pool, requester, window).await;
    Json(result).into_response()
}
