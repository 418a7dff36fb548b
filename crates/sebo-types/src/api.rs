use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{Condition, Genre, ListingKind};
use crate::patch::{Patch, opt_decimal, opt_year, patch_decimal, patch_year};

// -- JWT Claims --

/// JWT claims shared by the REST middleware and the auth handlers.
/// Canonical definition lives here in sebo-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by both register and login: public user fields plus a signed
/// bearer token. The password hash never appears here.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

// -- Users --

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub email: Patch<String>,
}

// -- Listings --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateListingRequest {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "opt_year")]
    pub year: Option<i32>,
    pub genre: Genre,
    #[serde(default, deserialize_with = "opt_decimal")]
    pub price: Option<f64>,
    pub condition: Condition,
    pub kind: ListingKind,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Partial update: absent fields keep their stored values, `null` clears
/// the nullable ones. `owner_id` is deliberately not here.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateListingRequest {
    #[serde(default)]
    pub title: Patch<String>,
    #[serde(default)]
    pub author: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub isbn: Patch<String>,
    #[serde(default)]
    pub publisher: Patch<String>,
    #[serde(default, deserialize_with = "patch_year")]
    pub year: Patch<i32>,
    #[serde(default)]
    pub genre: Patch<Genre>,
    #[serde(default, deserialize_with = "patch_decimal")]
    pub price: Patch<f64>,
    #[serde(default)]
    pub condition: Patch<Condition>,
    #[serde(default)]
    pub kind: Patch<ListingKind>,
    #[serde(default)]
    pub image_url: Patch<String>,
    #[serde(default)]
    pub active: Patch<bool>,
}

/// Owner display fields embedded in listing reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerInfo {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListingResponse {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<i32>,
    pub genre: Genre,
    pub price: Option<f64>,
    pub condition: Condition,
    pub kind: ListingKind,
    pub image_url: Option<String>,
    pub active: bool,
    pub owner_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Ratings --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRatingRequest {
    /// Numeric 1..5; translated to the stored named level at the boundary.
    pub value: u8,
    pub listing_id: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRatingRequest {
    #[serde(default)]
    pub value: Option<u8>,
    #[serde(default)]
    pub comment: Patch<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RatingResponse {
    pub id: i64,
    pub value: u8,
    pub comment: Option<String>,
    pub user_id: i64,
    pub listing_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub text: String,
    pub listing_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCommentRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: i64,
    pub text: String,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub listing_id: i64,
    pub created_at: DateTime<Utc>,
}
