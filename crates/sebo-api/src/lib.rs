pub mod auth;
pub mod comments;
pub mod error;
pub mod extract;
pub mod listings;
pub mod ratings;
pub mod users;

use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use crate::auth::AppState;
use crate::error::ApiError;

/// Full HTTP surface. Reads are public; every mutation handler gates on
/// the [`extract::CallerId`] bearer-token extractor.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/users/me", get(users::get_me))
        .route("/users/editMe", put(users::edit_me))
        .route("/users/deleteMe", delete(users::delete_me))
        .route("/anuncios", get(listings::list_listings).post(listings::create_listing))
        .route(
            "/anuncios/{id}",
            get(listings::get_listing)
                .put(listings::update_listing)
                .delete(listings::delete_listing),
        )
        .route("/anuncios/user/{user_id}", get(listings::list_user_listings))
        .route("/avaliacoes", post(ratings::create_rating))
        .route(
            "/avaliacoes/{id}",
            put(ratings::update_rating).delete(ratings::delete_rating),
        )
        .route("/avaliacoes/anuncio/{id}", get(ratings::list_ratings))
        .route("/comentarios", post(comments::create_comment))
        .route(
            "/comentarios/{id}",
            put(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/comentarios/anuncio/{id}", get(comments::list_comments))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "book marketplace API is up" }))
}

/// Ownership gate: runs only after the resource has been looked up, so a
/// non-owner sees 403 for rows that exist and 404 for rows that do not.
pub(crate) fn ensure_owner(owner_id: i64, caller_id: i64) -> Result<(), ApiError> {
    if owner_id == caller_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden("access denied: not the resource owner"))
    }
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC and convert, falling back for RFC 3339 text.
pub(crate) fn parse_timestamp(s: &str) -> DateTime<Utc> {
    s.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", s, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_owner_gates_on_identity() {
        assert!(ensure_owner(7, 7).is_ok());
        assert!(matches!(
            ensure_owner(7, 8),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn sqlite_timestamps_parse() {
        let ts = parse_timestamp("2026-08-30 12:00:00");
        assert_eq!(ts.to_rfc3339(), "2026-08-30T12:00:00+00:00");
        let ts = parse_timestamp("2026-08-30T12:00:00Z");
        assert_eq!(ts.to_rfc3339(), "2026-08-30T12:00:00+00:00");
    }
}
