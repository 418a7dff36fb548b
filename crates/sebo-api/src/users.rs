use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::WithRejection;

use sebo_db::models::UserRow;
use sebo_types::api::{UpdateProfileRequest, UserResponse};
use sebo_types::patch::Patch;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::CallerId;
use crate::parse_timestamp;

pub(crate) fn user_to_response(row: UserRow) -> UserResponse {
    UserResponse {
        id: row.id,
        name: row.name,
        email: row.email,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    }
}

pub async fn get_me(
    State(state): State<AppState>,
    caller: CallerId,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_id(caller.0)?
        .ok_or(ApiError::NotFound("user not found"))?;

    Ok(Json(user_to_response(user)))
}

pub async fn edit_me(
    State(state): State<AppState>,
    caller: CallerId,
    WithRejection(Json(req), _): WithRejection<Json<UpdateProfileRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    // Neither column is nullable; an explicit null is a payload error.
    let name = match &req.name {
        Patch::Missing => None,
        Patch::Null => return Err(ApiError::BadRequest("name cannot be null")),
        Patch::Value(n) if n.trim().is_empty() => {
            return Err(ApiError::BadRequest("name cannot be empty"));
        }
        Patch::Value(n) => Some(n.as_str()),
    };
    let email = match &req.email {
        Patch::Missing => None,
        Patch::Null => return Err(ApiError::BadRequest("email cannot be null")),
        Patch::Value(e) if !e.contains('@') => {
            return Err(ApiError::BadRequest("invalid email address"));
        }
        Patch::Value(e) => Some(e.as_str()),
    };

    // Existence check before the write so a stale token yields 404.
    state
        .db
        .get_user_by_id(caller.0)?
        .ok_or(ApiError::NotFound("user not found"))?;

    let user = match state.db.update_user(caller.0, name, email) {
        Ok(user) => user,
        Err(e) if sebo_db::is_unique_violation(&e) => {
            return Err(ApiError::Conflict("email already in use"));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(user_to_response(user)))
}

/// Cascading account deletion: the user's ratings, comments and listings
/// go with the row, all-or-nothing.
pub async fn delete_me(
    State(state): State<AppState>,
    caller: CallerId,
) -> Result<impl IntoResponse, ApiError> {
    // Run the multi-statement transaction off the async runtime
    let db = state.clone();
    let deleted = tokio::task::spawn_blocking(move || db.db.delete_user_cascade(caller.0))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {e}"))??;

    if !deleted {
        return Err(ApiError::NotFound("user not found"));
    }

    Ok(Json(serde_json::json!({
        "message": "account and all related data deleted"
    })))
}
