use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: String,
}

#[derive(Deserialize)]
struct JwtPayload {
    sub: String,
}

/// Identifies the caller from the backend-issued access token.
/// The signature was already checked by the auth gateway; only `sub` is read here.
pub async fn require_auth(mut request: Request, next: Next) -> Response {
    let user_id = access_token(request.headers()).and_then(|t| subject_from_jwt(&t));

    if let Some(id) = user_id {
        request.extensions_mut().insert(AuthenticatedUser { id });
        return next.run(request).await;
    }

    debug!("🔒 Rejected request without a usable access token");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "unauthorized" })),
    )
        .into_response()
}

/// `Authorization: Bearer` wins over the `access_token` cookie.
fn access_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get(header::COOKIE)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .map(str::trim)
                .find_map(|c| c.strip_prefix("access_token="))
                .map(|t| t.to_string())
        })
}

pub fn subject_from_jwt(token: &str) -> Option<String> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD.decode(payload).ok()?;
    let payload = serde_json::from_slice::<JwtPayload>(&payload_bytes).ok()?;
    Some(payload.sub).filter(|s| !s.trim().is_empty())
}
