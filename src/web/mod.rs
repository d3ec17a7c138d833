use std::sync::Arc;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use sqlx::SqlitePool;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::services::nearby_pharmacy_service::PharmacyLocator;
use crate::web::middleware::auth as auth_middleware;
use crate::web::routes::{health, pharmacies, prescriptions};

pub mod middleware;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub locator: Arc<PharmacyLocator>,
}

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/api/pharmacies/nearby",
            post(pharmacies::nearby_pharmacies_handler),
        )
        .route(
            "/api/prescriptions/nearby-pharmacies",
            post(prescriptions::prescription_nearby_pharmacies_handler),
        )
        .route(
            "/api/prescriptions/:prescription_id/dispatch",
            post(prescriptions::dispatch_handler),
        )
        .route(
            "/api/prescriptions/:prescription_id/arrival",
            post(prescriptions::arrival_handler),
        )
        .layer(from_fn(auth_middleware::require_auth));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(protected_routes)
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
