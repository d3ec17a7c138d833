use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::error::LocatorError;
use crate::models::Coordinate;

pub mod health;
pub mod pharmacies;
pub mod prescriptions;

fn invalid_coordinates() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": "invalid_coordinates" })),
    )
        .into_response()
}

/// Requester coordinates from a request body; anything unusable is a 400.
pub(crate) fn parse_requester(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Coordinate, Response> {
    Coordinate::from_parts(latitude, longitude).map_err(|_| invalid_coordinates())
}

pub(crate) fn error_response(err: LocatorError) -> Response {
    let (status, code) = match &err {
        LocatorError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        LocatorError::InvalidCoordinate { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_coordinates")
        }
        _ => {
            warn!("Request failed: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    };
    (status, Json(serde_json::json!({ "error": code }))).into_response()
}
