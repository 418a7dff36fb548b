use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS listings (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            title       TEXT NOT NULL,
            author      TEXT NOT NULL,
            description TEXT,
            isbn        TEXT,
            publisher   TEXT,
            year        INTEGER,
            genre       TEXT NOT NULL,
            price       REAL,
            condition   TEXT NOT NULL,
            kind        TEXT NOT NULL,
            image_url   TEXT,
            active      INTEGER NOT NULL DEFAULT 1,
            owner_id    INTEGER NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_listings_owner
            ON listings(owner_id);

        CREATE TABLE IF NOT EXISTS ratings (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            level       TEXT NOT NULL,
            comment     TEXT,
            user_id     INTEGER NOT NULL REFERENCES users(id),
            listing_id  INTEGER NOT NULL REFERENCES listings(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, listing_id)
        );

        CREATE INDEX IF NOT EXISTS idx_ratings_listing
            ON ratings(listing_id);

        CREATE TABLE IF NOT EXISTS comments (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            text        TEXT NOT NULL,
            user_id     INTEGER NOT NULL REFERENCES users(id),
            listing_id  INTEGER NOT NULL REFERENCES listings(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_listing
            ON comments(listing_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
