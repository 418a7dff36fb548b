use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use jsonwebtoken::{DecodingKey, Validation, decode};

use sebo_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// Authenticated caller identity. Extracting it validates the JWT from
/// the Authorization header against the process-wide secret in
/// [`AppState`]; handlers that take a `CallerId` argument are the
/// bearer-gated ones. Public paths share methods with gated ones (GET
/// /anuncios is open, POST is not), so the gate lives in the extractor
/// rather than a router-level middleware layer.
#[derive(Debug, Clone, Copy)]
pub struct CallerId(pub i64);

impl FromRequestParts<AppState> for CallerId {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized("missing bearer token"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("missing bearer token"))?;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| ApiError::Unauthorized("invalid or expired token"))?;

        Ok(CallerId(token_data.claims.sub))
    }
}
