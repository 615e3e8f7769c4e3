use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events sent FROM client TO server over the gateway WebSocket.
///
/// Wire format is `{"type": "...", "data": {...}}` with camelCase names,
/// e.g. `{"type":"sendMessage","data":{"groupId":"G","content":"hi"}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Subscribe this connection to a group's broadcast set. Idempotent;
    /// a connection may join several groups.
    JoinGroup { group_id: String },

    /// Post a message to a group. Sender identity always comes from the
    /// authenticated connection, never from the payload.
    SendMessage {
        #[serde(default)]
        group_id: String,
        #[serde(default)]
        content: String,
        #[serde(default)]
        is_anonymous: bool,
        /// Client display time; the server fills in its own clock when absent.
        timestamp: Option<String>,
    },

    /// Persist the connection owner's anonymity flag. Any client-supplied
    /// target user id is ignored.
    UpdateAnonStatus {
        #[serde(default)]
        is_anonymous: bool,
    },
}

/// Events sent FROM server TO client over the gateway WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// A message another member posted to a group this connection joined.
    /// The sender's own connection never receives this for its own send.
    ReceiveMessage {
        group_id: String,
        sender_id: Uuid,
        sender_name: String,
        content: String,
        is_anonymous: bool,
        timestamp: String,
    },

    /// A client event failed. The message is generic; detail stays in the
    /// server log.
    Error { message: String },
}
