use anyhow::{Result, anyhow};
use rusqlite::Connection;

use crate::models::UserRow;
use crate::{Database, OptionalExt};

impl Database {
    pub fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<UserRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (name, email, password) VALUES (?1, ?2, ?3)",
                (name, email, password_hash),
            )?;
            let id = conn.last_insert_rowid();
            query_user_by_id(conn, id)?.ok_or_else(|| anyhow!("user {} vanished after insert", id))
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{USER_SELECT} WHERE email = ?1"))?;
            stmt.query_row([email], row_to_user).optional()
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    /// Partial profile update. `None` keeps the stored value; neither
    /// column is nullable so there is no clear-to-NULL case here.
    pub fn update_user(&self, id: i64, name: Option<&str>, email: Option<&str>) -> Result<UserRow> {
        self.with_conn(|conn| {
            use rusqlite::types::Value;

            let mut sets = vec!["updated_at = datetime('now')".to_string()];
            let mut params: Vec<Value> = Vec::new();
            if let Some(name) = name {
                params.push(Value::Text(name.to_owned()));
                sets.push(format!("name = ?{}", params.len()));
            }
            if let Some(email) = email {
                params.push(Value::Text(email.to_owned()));
                sets.push(format!("email = ?{}", params.len()));
            }
            params.push(Value::Integer(id));
            let sql = format!(
                "UPDATE users SET {} WHERE id = ?{}",
                sets.join(", "),
                params.len()
            );
            conn.execute(&sql, rusqlite::params_from_iter(params))?;
            query_user_by_id(conn, id)?.ok_or_else(|| anyhow!("user {} vanished after update", id))
        })
    }

    /// Cascading account deletion, all-or-nothing. Removes, in order, the
    /// user's own ratings and comments, then ratings and comments left by
    /// anyone on the user's listings, then the listings, then the user
    /// row. Returns false when no such user exists (nothing deleted).
    pub fn delete_user_cascade(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute("DELETE FROM ratings WHERE user_id = ?1", [id])?;
            tx.execute("DELETE FROM comments WHERE user_id = ?1", [id])?;
            tx.execute(
                "DELETE FROM ratings WHERE listing_id IN
                     (SELECT id FROM listings WHERE owner_id = ?1)",
                [id],
            )?;
            tx.execute(
                "DELETE FROM comments WHERE listing_id IN
                     (SELECT id FROM listings WHERE owner_id = ?1)",
                [id],
            )?;
            tx.execute("DELETE FROM listings WHERE owner_id = ?1", [id])?;
            let deleted = tx.execute("DELETE FROM users WHERE id = ?1", [id])?;

            tx.commit()?;
            Ok(deleted > 0)
        })
    }
}

const USER_SELECT: &str = "SELECT id, name, email, password, created_at, updated_at FROM users";

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub(crate) fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT} WHERE id = ?1"))?;
    stmt.query_row([id], row_to_user).optional()
}

#[cfg(test)]
mod tests {
    use crate::{Database, is_unique_violation};

    #[test]
    fn create_and_fetch_user() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("Ana", "ana@example.com", "hash").unwrap();
        assert_eq!(user.name, "Ana");

        let by_email = db.get_user_by_email("ana@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert!(db.get_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_a_unique_violation() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("Ana", "ana@example.com", "hash").unwrap();
        let err = db.create_user("Bia", "ana@example.com", "hash").unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn update_user_keeps_omitted_fields() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user("Ana", "ana@example.com", "hash").unwrap();

        let updated = db.update_user(user.id, Some("Ana Maria"), None).unwrap();
        assert_eq!(updated.name, "Ana Maria");
        assert_eq!(updated.email, "ana@example.com");
    }

    #[test]
    fn delete_cascade_removes_dependents_of_both_kinds() {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_user("A", "a@example.com", "hash").unwrap();
        let b = db.create_user("B", "b@example.com", "hash").unwrap();

        // A owns a listing; B rates and comments on it; A comments on it too.
        let listing = crate::listings::tests::sample_listing(&db, a.id);
        db.upsert_rating(b.id, listing.id, "excellent", None).unwrap();
        db.create_comment(b.id, listing.id, "still available?").unwrap();
        db.create_comment(a.id, listing.id, "yes").unwrap();

        assert!(db.delete_user_cascade(a.id).unwrap());

        assert!(db.get_user_by_id(a.id).unwrap().is_none());
        assert!(db.get_listing(listing.id).unwrap().is_none());
        assert!(db.list_ratings_for_listing(listing.id).unwrap().is_empty());
        assert!(db.list_comments_for_listing(listing.id).unwrap().is_empty());
        // B is untouched
        assert!(db.get_user_by_id(b.id).unwrap().is_some());
    }

    #[test]
    fn delete_cascade_is_atomic_when_a_step_fails() {
        let db = Database::open_in_memory().unwrap();
        let a = db.create_user("A", "a@example.com", "hash").unwrap();
        let b = db.create_user("B", "b@example.com", "hash").unwrap();
        let listing = crate::listings::tests::sample_listing(&db, a.id);
        db.upsert_rating(b.id, listing.id, "good", None).unwrap();

        // Force the final step (the user-row delete) to fail.
        db.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER block_user_delete BEFORE DELETE ON users
                 BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
            )?;
            Ok(())
        })
        .unwrap();

        assert!(db.delete_user_cascade(a.id).is_err());

        // Nothing was removed: the earlier steps rolled back too.
        assert!(db.get_user_by_id(a.id).unwrap().is_some());
        assert!(db.get_listing(listing.id).unwrap().is_some());
        assert_eq!(db.list_ratings_for_listing(listing.id).unwrap().len(), 1);
    }

    #[test]
    fn delete_cascade_reports_missing_user() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.delete_user_cascade(999).unwrap());
    }
}
