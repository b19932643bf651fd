use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (accounts, memes, votes)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE groups (
                id          INTEGER PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE
            );

            CREATE TABLE users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                username        TEXT NOT NULL UNIQUE,
                first_name      TEXT NOT NULL DEFAULT '',
                last_name       TEXT NOT NULL DEFAULT '',
                password_hash   BLOB NOT NULL,
                password_salt   BLOB NOT NULL,
                is_active       INTEGER NOT NULL DEFAULT 0,
                group_id        INTEGER NOT NULL REFERENCES groups(id),
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE memes (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                title           TEXT NOT NULL,
                author_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                is_approved     INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL,
                approved_at     TEXT
            );

            CREATE INDEX idx_memes_approved ON memes(is_approved, id);

            -- One row per (meme, user); no row means no vote
            CREATE TABLE votes (
                meme_id     INTEGER NOT NULL REFERENCES memes(id) ON DELETE CASCADE,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                direction   TEXT NOT NULL CHECK (direction IN ('up', 'down')),
                PRIMARY KEY (meme_id, user_id)
            );

            CREATE INDEX idx_votes_meme ON votes(meme_id, direction);

            INSERT INTO groups (id, name) VALUES (1, 'admin'), (2, 'user');

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
