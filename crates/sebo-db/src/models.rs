//! Database row types — these map directly to SQLite rows.
//! Distinct from the sebo-types API models to keep the DB layer's enum
//! columns as plain storage strings.

#[derive(Debug)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct ListingRow {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<i32>,
    pub genre: String,
    pub price: Option<f64>,
    pub condition: String,
    pub kind: String,
    pub image_url: Option<String>,
    pub active: bool,
    pub owner_id: i64,
    /// Populated only by the owner-joining queries.
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct RatingRow {
    pub id: i64,
    pub level: String,
    pub comment: Option<String>,
    pub user_id: i64,
    pub listing_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

pub struct CommentRow {
    pub id: i64,
    pub text: String,
    pub user_id: i64,
    /// Populated only by the author-joining list query.
    pub user_name: Option<String>,
    pub listing_id: i64,
    pub created_at: String,
}
