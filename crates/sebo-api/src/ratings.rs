use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use sebo_db::models::RatingRow;
use sebo_types::api::{CreateRatingRequest, RatingResponse, UpdateRatingRequest};
use sebo_types::enums::RatingLevel;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::CallerId;
use crate::{ensure_owner, parse_timestamp};

fn rating_to_response(row: RatingRow) -> Result<RatingResponse, ApiError> {
    // Stored as the named level; clients only ever see the numeric form.
    let level = RatingLevel::parse(&row.level)
        .ok_or_else(|| anyhow!("corrupt rating level '{}' on rating {}", row.level, row.id))?;

    Ok(RatingResponse {
        id: row.id,
        value: level.value(),
        comment: row.comment,
        user_id: row.user_id,
        listing_id: row.listing_id,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    })
}

/// Create-or-update: a second rating by the same user on the same
/// listing lands on the existing row instead of tripping the unique
/// constraint.
pub async fn create_rating(
    State(state): State<AppState>,
    caller: CallerId,
    WithRejection(Json(req), _): WithRejection<Json<CreateRatingRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let level = RatingLevel::from_value(req.value)
        .ok_or(ApiError::BadRequest("rating value must be between 1 and 5"))?;

    if !state.db.listing_exists(req.listing_id)? {
        return Err(ApiError::NotFound("listing not found"));
    }

    let row = state.db.upsert_rating(
        caller.0,
        req.listing_id,
        level.as_str(),
        req.comment.as_deref(),
    )?;

    Ok((StatusCode::CREATED, Json(rating_to_response(row)?)))
}

pub async fn update_rating(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateRatingRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let level = req
        .value
        .map(|v| {
            RatingLevel::from_value(v)
                .ok_or(ApiError::BadRequest("rating value must be between 1 and 5"))
        })
        .transpose()?;

    let row = state
        .db
        .get_rating(id)?
        .ok_or(ApiError::NotFound("rating not found"))?;
    ensure_owner(row.user_id, caller.0)?;

    let updated = state
        .db
        .update_rating(id, level.map(|l| l.as_str()), &req.comment)?;

    Ok(Json(rating_to_response(updated)?))
}

pub async fn delete_rating(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_rating(id)?
        .ok_or(ApiError::NotFound("rating not found"))?;
    ensure_owner(row.user_id, caller.0)?;

    state.db.delete_rating(id)?;

    Ok(Json(serde_json::json!({
        "message": "rating deleted",
        "rating": rating_to_response(row)?,
    })))
}

pub async fn list_ratings(
    State(state): State<AppState>,
    Path(listing_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_ratings_for_listing(listing_id)?;

    let ratings = rows
        .into_iter()
        .map(rating_to_response)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ratings))
}
