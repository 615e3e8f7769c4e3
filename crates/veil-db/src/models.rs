//! Database row types, mapping directly to SQLite rows. Distinct from the
//! veil-types API models to keep the store independent.

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Argon2 PHC hash string, never the plaintext.
    pub password: String,
    pub theme: Option<String>,
    pub is_anonymous: bool,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub group_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub is_anonymous: bool,
    /// Client display time captured at send.
    pub timestamp: String,
    /// Server-assigned RFC 3339 instant; authoritative for history order.
    pub created_at: String,
}
