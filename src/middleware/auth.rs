use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

fn decode_bearer(headers: &HeaderMap) -> Option<std::result::Result<Claims, ()>> {
    let auth = headers.get(AUTHORIZATION)?;
    let token = auth.to_str().ok()?.strip_prefix("Bearer ")?;

    let config = crate::config::get_config();
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    Some(
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| ()),
    )
}

/// Admin-API gate: a valid bearer token with the admin role.
pub async fn require_admin(mut req: Request, next: Next) -> Response {
    match decode_bearer(req.headers()) {
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"missing_authorization"})),
        )
            .into_response(),
        Some(Err(())) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"invalid_token"})),
        )
            .into_response(),
        Some(Ok(claims)) => {
            let role = claims.role.clone().unwrap_or_default();
            if !role.eq_ignore_ascii_case("admin") {
                return (StatusCode::FORBIDDEN, Json(json!({"error":"forbidden"})))
                    .into_response();
            }
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
    }
}

/// Submitter identity for the public surface. No header means guest; a
/// malformed or expired token is rejected rather than silently downgraded.
pub fn submitter_user_id(headers: &HeaderMap) -> Result<Option<Uuid>> {
    match decode_bearer(headers) {
        None => Ok(None),
        Some(Err(())) => Err(Error::Unauthorized("invalid_token".into())),
        Some(Ok(claims)) => claims
            .sub
            .parse::<Uuid>()
            .map(Some)
            .map_err(|_| Error::Unauthorized("invalid_subject".into())),
    }
}
