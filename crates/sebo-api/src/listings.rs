use anyhow::anyhow;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use sebo_db::models::ListingRow;
use sebo_types::api::{
    CreateListingRequest, ListingResponse, OwnerInfo, UpdateListingRequest,
};
use sebo_types::enums::{Condition, Genre, ListingKind};
use sebo_types::patch::Patch;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::CallerId;
use crate::{ensure_owner, parse_timestamp};

pub(crate) fn listing_to_response(
    row: ListingRow,
    include_owner: bool,
) -> Result<ListingResponse, ApiError> {
    let genre = Genre::parse(&row.genre)
        .ok_or_else(|| anyhow!("corrupt genre '{}' on listing {}", row.genre, row.id))?;
    let condition = Condition::parse(&row.condition)
        .ok_or_else(|| anyhow!("corrupt condition '{}' on listing {}", row.condition, row.id))?;
    let kind = ListingKind::parse(&row.kind)
        .ok_or_else(|| anyhow!("corrupt kind '{}' on listing {}", row.kind, row.id))?;

    let owner = if include_owner {
        match (row.owner_name, row.owner_email) {
            (Some(name), Some(email)) => Some(OwnerInfo { name, email }),
            _ => None,
        }
    } else {
        None
    };

    Ok(ListingResponse {
        id: row.id,
        title: row.title,
        author: row.author,
        description: row.description,
        isbn: row.isbn,
        publisher: row.publisher,
        year: row.year,
        genre,
        price: row.price,
        condition,
        kind,
        image_url: row.image_url,
        active: row.active,
        owner_id: row.owner_id,
        owner,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    })
}

fn validate_create(req: &CreateListingRequest) -> Result<(), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required"));
    }
    if req.author.trim().is_empty() {
        return Err(ApiError::BadRequest("author is required"));
    }
    if req.price.is_some_and(|p| p < 0.0 || !p.is_finite()) {
        return Err(ApiError::BadRequest("price must be a non-negative number"));
    }
    Ok(())
}

fn validate_patch(req: &UpdateListingRequest) -> Result<(), ApiError> {
    // Explicit null is only meaningful for the nullable columns.
    if matches!(req.title, Patch::Null) || matches!(req.title, Patch::Value(ref t) if t.trim().is_empty()) {
        return Err(ApiError::BadRequest("title cannot be empty"));
    }
    if matches!(req.author, Patch::Null) || matches!(req.author, Patch::Value(ref a) if a.trim().is_empty()) {
        return Err(ApiError::BadRequest("author cannot be empty"));
    }
    if matches!(req.genre, Patch::Null) {
        return Err(ApiError::BadRequest("genre cannot be null"));
    }
    if matches!(req.condition, Patch::Null) {
        return Err(ApiError::BadRequest("condition cannot be null"));
    }
    if matches!(req.kind, Patch::Null) {
        return Err(ApiError::BadRequest("kind cannot be null"));
    }
    if matches!(req.active, Patch::Null) {
        return Err(ApiError::BadRequest("active cannot be null"));
    }
    if matches!(req.price, Patch::Value(p) if p < 0.0 || !p.is_finite()) {
        return Err(ApiError::BadRequest("price must be a non-negative number"));
    }
    Ok(())
}

// -- Public reads --

pub async fn list_listings(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_active_listings())
        .await
        .map_err(|e| anyhow!("spawn_blocking join error: {e}"))??;

    let listings = rows
        .into_iter()
        .map(|row| listing_to_response(row, true))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(listings))
}

pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_listing(id)?
        .ok_or(ApiError::NotFound("listing not found"))?;

    Ok(Json(listing_to_response(row, true)?))
}

pub async fn list_user_listings(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_listings_by_owner(user_id))
        .await
        .map_err(|e| anyhow!("spawn_blocking join error: {e}"))??;

    let listings = rows
        .into_iter()
        .map(|row| listing_to_response(row, true))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(listings))
}

// -- Owner-gated writes --

pub async fn create_listing(
    State(state): State<AppState>,
    caller: CallerId,
    WithRejection(Json(req), _): WithRejection<Json<CreateListingRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    validate_create(&req)?;

    let row = state.db.create_listing(caller.0, &req)?;

    Ok((StatusCode::CREATED, Json(listing_to_response(row, false)?)))
}

pub async fn update_listing(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateListingRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    validate_patch(&req)?;

    // Existence first, then ownership: a non-owner learns 403, not 404.
    let row = state
        .db
        .get_listing(id)?
        .ok_or(ApiError::NotFound("listing not found"))?;
    ensure_owner(row.owner_id, caller.0)?;

    let updated = state.db.update_listing(id, &req)?;

    Ok(Json(listing_to_response(updated, false)?))
}

pub async fn delete_listing(
    State(state): State<AppState>,
    caller: CallerId,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let row = state
        .db
        .get_listing(id)?
        .ok_or(ApiError::NotFound("listing not found"))?;
    ensure_owner(row.owner_id, caller.0)?;

    // Cascades to the listing's ratings and comments in one transaction.
    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.delete_listing_cascade(id))
        .await
        .map_err(|e| anyhow!("spawn_blocking join error: {e}"))??;

    Ok(Json(serde_json::json!({
        "message": "listing deleted",
        "listing": listing_to_response(row, false)?,
    })))
}
