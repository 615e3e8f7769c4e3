use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id            TEXT PRIMARY KEY,
            name          TEXT NOT NULL,
            email         TEXT NOT NULL UNIQUE,
            password      TEXT NOT NULL,
            theme         TEXT,
            is_anonymous  INTEGER NOT NULL DEFAULT 1,
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS messages (
            id            TEXT PRIMARY KEY,
            group_id      TEXT NOT NULL,
            sender_id     TEXT NOT NULL REFERENCES users(id),
            sender_name   TEXT NOT NULL,
            content       TEXT NOT NULL,
            is_anonymous  INTEGER NOT NULL DEFAULT 1,
            timestamp     TEXT NOT NULL,
            created_at    TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_group
            ON messages(group_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
