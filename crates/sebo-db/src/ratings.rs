use anyhow::{Result, anyhow};
use rusqlite::Connection;
use rusqlite::types::Value;

use sebo_types::patch::Patch;

use crate::models::RatingRow;
use crate::{Database, OptionalExt};

impl Database {
    /// One rating per (user, listing): a second create lands on the
    /// existing row via ON CONFLICT, so a concurrent duplicate insert can
    /// never surface a constraint error to the caller.
    pub fn upsert_rating(
        &self,
        user_id: i64,
        listing_id: i64,
        level: &str,
        comment: Option<&str>,
    ) -> Result<RatingRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO ratings (level, comment, user_id, listing_id)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id, listing_id) DO UPDATE SET
                     level = excluded.level,
                     comment = excluded.comment,
                     updated_at = datetime('now')",
                rusqlite::params![level, comment, user_id, listing_id],
            )?;

            let mut stmt = conn.prepare(&format!(
                "{RATING_SELECT} WHERE user_id = ?1 AND listing_id = ?2"
            ))?;
            stmt.query_row([user_id, listing_id], row_to_rating)
                .map_err(|e| anyhow!("rating ({user_id}, {listing_id}) missing after upsert: {e}"))
        })
    }

    pub fn get_rating(&self, id: i64) -> Result<Option<RatingRow>> {
        self.with_conn(|conn| query_rating(conn, id))
    }

    pub fn update_rating(
        &self,
        id: i64,
        level: Option<&str>,
        comment: &Patch<String>,
    ) -> Result<RatingRow> {
        self.with_conn(|conn| {
            let mut sets = vec!["updated_at = datetime('now')".to_string()];
            let mut params: Vec<Value> = Vec::new();
            if let Some(level) = level {
                params.push(Value::Text(level.to_owned()));
                sets.push(format!("level = ?{}", params.len()));
            }
            match comment {
                Patch::Missing => {}
                Patch::Null => sets.push("comment = NULL".to_string()),
                Patch::Value(c) => {
                    params.push(Value::Text(c.clone()));
                    sets.push(format!("comment = ?{}", params.len()));
                }
            }
            params.push(Value::Integer(id));
            let sql = format!(
                "UPDATE ratings SET {} WHERE id = ?{}",
                sets.join(", "),
                params.len()
            );
            conn.execute(&sql, rusqlite::params_from_iter(params))?;

            query_rating(conn, id)?.ok_or_else(|| anyhow!("rating {} vanished after update", id))
        })
    }

    pub fn delete_rating(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM ratings WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn list_ratings_for_listing(&self, listing_id: i64) -> Result<Vec<RatingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{RATING_SELECT} WHERE listing_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt
                .query_map([listing_id], row_to_rating)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

const RATING_SELECT: &str =
    "SELECT id, level, comment, user_id, listing_id, created_at, updated_at FROM ratings";

fn row_to_rating(row: &rusqlite::Row<'_>) -> rusqlite::Result<RatingRow> {
    Ok(RatingRow {
        id: row.get(0)?,
        level: row.get(1)?,
        comment: row.get(2)?,
        user_id: row.get(3)?,
        listing_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn query_rating(conn: &Connection, id: i64) -> Result<Option<RatingRow>> {
    let mut stmt = conn.prepare(&format!("{RATING_SELECT} WHERE id = ?1"))?;
    stmt.query_row([id], row_to_rating).optional()
}
