use anyhow::{Result, anyhow};
use rusqlite::Connection;
use rusqlite::types::Value;

use sebo_types::api::{CreateListingRequest, UpdateListingRequest};
use sebo_types::patch::Patch;

use crate::models::ListingRow;
use crate::{Database, OptionalExt};

impl Database {
    pub fn create_listing(&self, owner_id: i64, req: &CreateListingRequest) -> Result<ListingRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO listings
                     (title, author, description, isbn, publisher, year, genre,
                      price, condition, kind, image_url, owner_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                rusqlite::params![
                    req.title,
                    req.author,
                    req.description,
                    req.isbn,
                    req.publisher,
                    req.year,
                    req.genre.as_str(),
                    req.price,
                    req.condition.as_str(),
                    req.kind.as_str(),
                    req.image_url,
                    owner_id,
                ],
            )?;
            let id = conn.last_insert_rowid();
            query_listing(conn, id)?.ok_or_else(|| anyhow!("listing {} vanished after insert", id))
        })
    }

    pub fn get_listing(&self, id: i64) -> Result<Option<ListingRow>> {
        self.with_conn(|conn| query_listing(conn, id))
    }

    pub fn listing_exists(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row("SELECT id FROM listings WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(found.is_some())
        })
    }

    pub fn list_active_listings(&self) -> Result<Vec<ListingRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("{LISTING_SELECT} WHERE l.active = 1 ORDER BY l.id"))?;
            let rows = stmt
                .query_map([], row_to_listing)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_listings_by_owner(&self, owner_id: i64) -> Result<Vec<ListingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{LISTING_SELECT} WHERE l.owner_id = ?1 AND l.active = 1 ORDER BY l.id"
            ))?;
            let rows = stmt
                .query_map([owner_id], row_to_listing)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Partial update. Only the fields present in the patch are written;
    /// `owner_id` is never touched. Callers have already rejected NULL on
    /// the non-nullable columns.
    pub fn update_listing(&self, id: i64, patch: &UpdateListingRequest) -> Result<ListingRow> {
        self.with_conn(|conn| {
            let mut sets = vec!["updated_at = datetime('now')".to_string()];
            let mut params: Vec<Value> = Vec::new();

            set_text(&mut sets, &mut params, "title", &patch.title);
            set_text(&mut sets, &mut params, "author", &patch.author);
            set_text(&mut sets, &mut params, "description", &patch.description);
            set_text(&mut sets, &mut params, "isbn", &patch.isbn);
            set_text(&mut sets, &mut params, "publisher", &patch.publisher);
            match &patch.year {
                Patch::Missing => {}
                Patch::Null => push_set(&mut sets, &mut params, "year", Value::Null),
                Patch::Value(y) => {
                    push_set(&mut sets, &mut params, "year", Value::Integer(*y as i64))
                }
            }
            if let Patch::Value(g) = &patch.genre {
                push_set(&mut sets, &mut params, "genre", Value::Text(g.as_str().into()));
            }
            match &patch.price {
                Patch::Missing => {}
                Patch::Null => push_set(&mut sets, &mut params, "price", Value::Null),
                Patch::Value(p) => push_set(&mut sets, &mut params, "price", Value::Real(*p)),
            }
            if let Patch::Value(c) = &patch.condition {
                push_set(&mut sets, &mut params, "condition", Value::Text(c.as_str().into()));
            }
            if let Patch::Value(k) = &patch.kind {
                push_set(&mut sets, &mut params, "kind", Value::Text(k.as_str().into()));
            }
            set_text(&mut sets, &mut params, "image_url", &patch.image_url);
            if let Patch::Value(a) = &patch.active {
                push_set(&mut sets, &mut params, "active", Value::Integer(*a as i64));
            }

            params.push(Value::Integer(id));
            let sql = format!(
                "UPDATE listings SET {} WHERE id = ?{}",
                sets.join(", "),
                params.len()
            );
            conn.execute(&sql, rusqlite::params_from_iter(params))?;

            query_listing(conn, id)?.ok_or_else(|| anyhow!("listing {} vanished after update", id))
        })
    }

    /// Deletes a listing together with its ratings and comments, in one
    /// transaction. With foreign_keys=ON a bare row delete would be
    /// rejected as soon as anyone rated or commented, so the cascade is
    /// not optional here.
    pub fn delete_listing_cascade(&self, id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM ratings WHERE listing_id = ?1", [id])?;
            tx.execute("DELETE FROM comments WHERE listing_id = ?1", [id])?;
            tx.execute("DELETE FROM listings WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(())
        })
    }
}

const LISTING_SELECT: &str = "SELECT l.id, l.title, l.author, l.description, l.isbn,
            l.publisher, l.year, l.genre, l.price, l.condition, l.kind,
            l.image_url, l.active, l.owner_id, u.name, u.email,
            l.created_at, l.updated_at
     FROM listings l
     LEFT JOIN users u ON l.owner_id = u.id";

fn row_to_listing(row: &rusqlite::Row<'_>) -> rusqlite::Result<ListingRow> {
    Ok(ListingRow {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        description: row.get(3)?,
        isbn: row.get(4)?,
        publisher: row.get(5)?,
        year: row.get(6)?,
        genre: row.get(7)?,
        price: row.get(8)?,
        condition: row.get(9)?,
        kind: row.get(10)?,
        image_url: row.get(11)?,
        active: row.get(12)?,
        owner_id: row.get(13)?,
        owner_name: row.get(14)?,
        owner_email: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

pub(crate) fn query_listing(conn: &Connection, id: i64) -> Result<Option<ListingRow>> {
    let mut stmt = conn.prepare(&format!("{LISTING_SELECT} WHERE l.id = ?1"))?;
    stmt.query_row([id], row_to_listing).optional()
}

fn push_set(sets: &mut Vec<String>, params: &mut Vec<Value>, col: &str, v: Value) {
    params.push(v);
    sets.push(format!("{col} = ?{}", params.len()));
}

fn set_text(sets: &mut Vec<String>, params: &mut Vec<Value>, col: &str, p: &Patch<String>) {
    match p {
        Patch::Missing => {}
        Patch::Null => push_set(sets, params, col, Value::Null),
        Patch::Value(s) => push_set(sets, params, col, Value::Text(s.clone())),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use sebo_types::api::{CreateListingRequest, UpdateListingRequest};
    use sebo_types::enums::{Condition, Genre, ListingKind};
    use sebo_types::patch::Patch;

    use crate::Database;
    use crate::models::ListingRow;

    pub(crate) fn sample_listing(db: &Database, owner_id: i64) -> ListingRow {
        db.create_listing(
            owner_id,
            &CreateListingRequest {
                title: "Duna".into(),
                author: "Frank Herbert".into(),
                description: Some("Collector's edition".into()),
                isbn: Some("9788576574826".into()),
                publisher: Some("Aleph".into()),
                year: Some(2017),
                genre: Genre::ScienceFiction,
                price: Some(89.9),
                condition: Condition::LikeNew,
                kind: ListingKind::Sale,
                image_url: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn create_and_fetch_with_owner_fields() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.create_user("Ana", "ana@example.com", "hash").unwrap();
        let listing = sample_listing(&db, owner.id);

        let fetched = db.get_listing(listing.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Duna");
        assert_eq!(fetched.genre, "science-fiction");
        assert_eq!(fetched.owner_id, owner.id);
        assert_eq!(fetched.owner_name.as_deref(), Some("Ana"));
        assert!(fetched.active);

        assert!(db.get_listing(listing.id + 1).unwrap().is_none());
    }

    #[test]
    fn partial_update_touches_only_present_fields() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.create_user("Ana", "ana@example.com", "hash").unwrap();
        let listing = sample_listing(&db, owner.id);

        let patch = UpdateListingRequest {
            title: Patch::Value("Duna (capa dura)".into()),
            price: Patch::Null,
            ..Default::default()
        };
        let updated = db.update_listing(listing.id, &patch).unwrap();

        assert_eq!(updated.title, "Duna (capa dura)");
        assert_eq!(updated.price, None);
        // everything omitted stays put
        assert_eq!(updated.author, "Frank Herbert");
        assert_eq!(updated.isbn.as_deref(), Some("9788576574826"));
        assert_eq!(updated.owner_id, owner.id);
    }

    #[test]
    fn inactive_listings_are_hidden_from_the_public_lists() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.create_user("Ana", "ana@example.com", "hash").unwrap();
        let keep = sample_listing(&db, owner.id);
        let hide = sample_listing(&db, owner.id);

        let patch = UpdateListingRequest {
            active: Patch::Value(false),
            ..Default::default()
        };
        db.update_listing(hide.id, &patch).unwrap();

        let all = db.list_active_listings().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, keep.id);

        let mine = db.list_listings_by_owner(owner.id).unwrap();
        assert_eq!(mine.len(), 1);
    }

    #[test]
    fn delete_cascade_removes_ratings_and_comments() {
        let db = Database::open_in_memory().unwrap();
        let owner = db.create_user("Ana", "ana@example.com", "hash").unwrap();
        let rater = db.create_user("Bia", "bia@example.com", "hash").unwrap();
        let listing = sample_listing(&db, owner.id);

        db.upsert_rating(rater.id, listing.id, "good", Some("nice copy")).unwrap();
        db.create_comment(rater.id, listing.id, "is it available?").unwrap();

        db.delete_listing_cascade(listing.id).unwrap();

        assert!(db.get_listing(listing.id).unwrap().is_none());
        assert!(db.list_ratings_for_listing(listing.id).unwrap().is_empty());
        assert!(db.list_comments_for_listing(listing.id).unwrap().is_empty());
    }
}
