use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::services::nearby_pharmacy_service::NearbyPharmacy;
use crate::services::prescription_dispatch_service;
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::routes::{error_response, parse_requester};
use crate::web::AppState;

fn missing_fields() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": "missing_fields" })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionNearbyBody {
    pub prescription_id: Option<String>,
    pub user_latitude: Option<f64>,
    pub user_longitude: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionNearbyResponse {
    pub prescription_id: String,
    pub total_pharmacies: usize,
    pub pharmacies: Vec<NearbyPharmacy>,
    pub auto_expanded: bool,
    pub effective_max_distance_km: f64,
}

pub async fn prescription_nearby_pharmacies_handler(
    Extension(_auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Json(body): Json<PrescriptionNearbyBody>,
) -> Response {
    let Some(prescription_id) = body
        .prescription_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    else {
        return missing_fields();
    };
    let requester = match parse_requester(body.user_latitude, body.user_longitude) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let nearby = state
        .locator
        .find_nearby(
            &state.pool,
            requester,
            state.locator.settings.default_window(),
        )
        .await;

    Json(PrescriptionNearbyResponse {
        prescription_id,
        total_pharmacies: nearby.pharmacies.len(),
        pharmacies: nearby.pharmacies,
        auto_expanded: nearby.auto_expanded,
        effective_max_distance_km: nearby.effective_max_distance_km,
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchBody {
    pub user_latitude: Option<f64>,
    pub user_longitude: Option<f64>,
}

pub async fn dispatch_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(prescription_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<DispatchBody>,
) -> Response {
    let requester = match parse_requester(body.user_latitude, body.user_longitude) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match prescription_dispatch_service::dispatch_prescription(
        &state.pool,
        &state.locator,
        &auth_user.id,
        &prescription_id,
        requester,
    )
    .await
    {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalBody {
    pub pharmacy_id: Option<String>,
    pub user_latitude: Option<f64>,
    pub user_longitude: Option<f64>,
}

pub async fn arrival_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(prescription_id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<ArrivalBody>,
) -> Response {
    let Some(pharmacy_id) = body
        .pharmacy_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    else {
        return missing_fields();
    };
    let requester = match parse_requester(body.user_latitude, body.user_longitude) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match prescription_dispatch_service::notify_pharmacy_of_arrival(
        &state.pool,
        &auth_user.id,
        &prescription_id,
        &pharmacy_id,
        requester,
    )
    .await
    {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(e),
    }
}
