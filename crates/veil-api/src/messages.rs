use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::warn;
use uuid::Uuid;

use veil_session::SessionUser;
use veil_types::models::Message;

use crate::auth::AppState;
use crate::error::{ApiError, join_error};

/// Full chronological history for one group. Any authenticated user may
/// read any group; there are no per-group memberships or ACLs.
pub async fn history(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Extension(_user): Extension<SessionUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let gid = group_id.clone();
    let rows = tokio::task::spawn_blocking(move || db.messages_for_group(&gid))
        .await
        .map_err(join_error)??;

    // Corrupt rows degrade to defaults rather than failing the whole page.
    let messages: Vec<Message> = rows
        .into_iter()
        .map(|row| Message {
            id: row.id.parse().unwrap_or_else(|e| {
                warn!("corrupt message id '{}': {}", row.id, e);
                Uuid::default()
            }),
            group_id: row.group_id,
            sender_id: row.sender_id.parse().unwrap_or_else(|e| {
                warn!("corrupt sender_id '{}' on message '{}': {}", row.sender_id, row.id, e);
                Uuid::default()
            }),
            sender_name: row.sender_name,
            content: row.content,
            is_anonymous: row.is_anonymous,
            timestamp: row.timestamp,
            created_at: row.created_at.parse().unwrap_or_else(|e| {
                warn!("corrupt created_at '{}' on message '{}': {}", row.created_at, row.id, e);
                chrono::DateTime::default()
            }),
        })
        .collect();

    Ok(Json(messages))
}
