use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use sebo_db::models::CommentRow;
use sebo_types::api::{CommentResponse, CreateCommentRequest, UpdateCommentRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::CallerId;
use crate::{ensure_owner, parse_timestamp};

fn comment_to_response(row: CommentRow) -> CommentResponse {
    CommentResponse {
        id: row.id,
        text: row.text,
        user_id: row.user_id,
        user_name: row.user_name,
        listing_id: row.listing_id,
        created_at: parse_timestamp(&row.created_at),
    }
}

pub async fn create_comment(
    State(state): State<AppState>,
    caller: CallerId,
    WithRejection(Json(req), _): WithRejection<Json<CreateCommentRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text is required"));
    }
    if !state.db.listing_exists(req.listing_id)? {
        return Err(ApiError::NotFound("listing not found"));
    }

    let row = state.db.create_comment(caller.0, req.listing_id, &req.text)?;

    Ok((StatusCode::CREATED, Json(comment_to_response(row))))
}

pub async fn update_comment(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateCommentRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text is required"));
    }

    let row = state
        .db
        .get_comment(id)?
        .ok_or(ApiError::NotFound("comment not found"))?;
    ensure_owner(row.user_id, caller.0)?;

    let updated = state.db.update_comment(id, &req.text)?;

    Ok(Json(comment_to_response(updated)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_comment(id)?
        .ok_or(ApiError::NotFound("comment not found"))?;
    ensure_owner(row.user_id, caller.0)?;

    state.db.delete_comment(id)?;

    Ok(Json(serde_json::json!({
        "message": "comment deleted",
        "comment": comment_to_response(row),
    })))
}

/// Newest first, with author display names.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(listing_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_comments_for_listing(listing_id))
        .await
        .map_err(|e| anyhow!("spawn_blocking join error: {e}"))??;

    let comments: Vec<CommentResponse> = rows.into_iter().map(comment_to_response).collect();

    Ok(Json(comments))
}
