use anyhow::{Result, anyhow};
use rusqlite::Connection;

use crate::models::CommentRow;
use crate::{Database, OptionalExt};

impl Database {
    pub fn create_comment(&self, user_id: i64, listing_id: i64, text: &str) -> Result<CommentRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (text, user_id, listing_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![text, user_id, listing_id],
            )?;
            let id = conn.last_insert_rowid();
            query_comment(conn, id)?.ok_or_else(|| anyhow!("comment {} vanished after insert", id))
        })
    }

    pub fn get_comment(&self, id: i64) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| query_comment(conn, id))
    }

    pub fn update_comment(&self, id: i64, text: &str) -> Result<CommentRow> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE comments SET text = ?1 WHERE id = ?2",
                rusqlite::params![text, id],
            )?;
            query_comment(conn, id)?.ok_or_else(|| anyhow!("comment {} vanished after update", id))
        })
    }

    pub fn delete_comment(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// Newest first, with the author's display name joined in (no N+1).
    pub fn list_comments_for_listing(&self, listing_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.text, c.user_id, u.name, c.listing_id, c.created_at
                 FROM comments c
                 LEFT JOIN users u ON c.user_id = u.id
                 WHERE c.listing_id = ?1
                 ORDER BY c.created_at DESC, c.id DESC",
            )?;
            let rows = stmt
                .query_map([listing_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        text: row.get(1)?,
                        user_id: row.get(2)?,
                        user_name: row.get(3)?,
                        listing_id: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_comment(conn: &Connection, id: i64) -> Result<Option<CommentRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, text, user_id, listing_id, created_at FROM comments WHERE id = ?1",
    )?;
    stmt.query_row([id], |row| {
        Ok(CommentRow {
            id: row.get(0)?,
            text: row.get(1)?,
            user_id: row.get(2)?,
            user_name: None,
            listing_id: row.get(3)?,
            created_at: row.get(4)?,
        })
    })
    .optional()
}
