use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use jsonwebtoken::{EncodingKey, Header, encode};

use sebo_db::Database;
use sebo_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};

use crate::error::ApiError;
use crate::users::user_to_response;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if req.name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(ApiError::BadRequest("name, email and password are required"));
    }
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest("invalid email address"));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest("password must be at least 8 characters"));
    }

    // Check if the email is taken
    if state.db.get_user_by_email(&req.email)?.is_some() {
        return Err(ApiError::Conflict("email already in use"));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
        .to_string();

    let user = match state.db.create_user(&req.name, &req.email, &password_hash) {
        Ok(user) => user,
        // Lost a race with a concurrent registration for the same email.
        Err(e) if sebo_db::is_unique_violation(&e) => {
            return Err(ApiError::Conflict("email already in use"));
        }
        Err(e) => return Err(e.into()),
    };

    let token = create_token(&state.jwt_secret, user.id)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user_to_response(user),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    // Unknown email and wrong password return the same body, so a caller
    // cannot enumerate accounts.
    let user = state
        .db
        .get_user_by_email(&req.email)?
        .ok_or(ApiError::Unauthorized("invalid credentials"))?;

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("stored hash unreadable: {e}"))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized("invalid credentials"))?;

    let token = create_token(&state.jwt_secret, user.id)?;

    Ok(Json(AuthResponse {
        user: user_to_response(user),
        token,
    }))
}

/// Tokens are bound to the user id and expire after 8 hours.
pub fn create_token(secret: &str, user_id: i64) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        exp: (chrono::Utc::now() + chrono::Duration::hours(8)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
