use crate::Database;
use crate::models::{MessageRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    /// Email is normalized to lowercase here so uniqueness is
    /// case-insensitive regardless of what the caller passes in.
    pub fn create_user(
        &self,
        id: &str,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<()> {
        let email = email.to_lowercase();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, email, password) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, name, email, password_hash],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        let email = email.to_lowercase();
        self.with_conn(|conn| query_user(conn, "email", &email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Merge-update the preference pair: a `None` field keeps the stored
    /// value. Returns the updated row, or `None` for an unknown user.
    pub fn update_preferences(
        &self,
        id: &str,
        theme: Option<&str>,
        is_anonymous: Option<bool>,
    ) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users
                 SET theme = COALESCE(?2, theme),
                     is_anonymous = COALESCE(?3, is_anonymous)
                 WHERE id = ?1",
                rusqlite::params![id, theme, is_anonymous],
            )?;
            query_user(conn, "id", id)
        })
    }

    // -- Messages --

    /// Append-only; the caller assigns id and created_at up front so the
    /// broadcast right after can reuse exactly what was persisted.
    pub fn insert_message(&self, msg: &MessageRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages
                     (id, group_id, sender_id, sender_name, content, is_anonymous, timestamp, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    msg.id,
                    msg.group_id,
                    msg.sender_id,
                    msg.sender_name,
                    msg.content,
                    msg.is_anonymous,
                    msg.timestamp,
                    msg.created_at,
                ],
            )?;
            Ok(())
        })
    }

    /// Full history for one group, oldest first. Unbounded by design: the
    /// deployment target is a single small group.
    pub fn messages_for_group(&self, group_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, group_id, sender_id, sender_name, content, is_anonymous, timestamp, created_at
                 FROM messages
                 WHERE group_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )?;

            let rows = stmt
                .query_map([group_id], |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        group_id: row.get(1)?,
                        sender_id: row.get(2)?,
                        sender_name: row.get(3)?,
                        content: row.get(4)?,
                        is_anonymous: row.get(5)?,
                        timestamp: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

/// True when the error is a SQLite uniqueness/constraint violation, e.g.
/// a second signup with an already-registered email.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is always a literal from this module, never caller input.
    let sql = format!(
        "SELECT id, name, email, password, theme, is_anonymous, created_at
         FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                theme: row.get(4)?,
                is_anonymous: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
