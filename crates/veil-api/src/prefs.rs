use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use veil_db::models::UserRow;
use veil_session::SessionUser;
use veil_types::api::UpdatePrefsRequest;
use veil_types::models::{Preferences, Theme};

use crate::auth::AppState;
use crate::error::{ApiError, join_error};

/// Preferences are strictly owner-private: the path id must match the
/// session's own id, with no admin override.
fn check_owner(user: &SessionUser, user_id: &str) -> Result<(), ApiError> {
    if user.id.to_string() != user_id {
        return Err(ApiError::Forbidden("forbidden".into()));
    }
    Ok(())
}

pub async fn get_prefs(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, ApiError> {
    check_owner(&user, &user_id)?;

    let db = state.db.clone();
    let id = user_id.clone();
    let row = tokio::task::spawn_blocking(move || db.get_user_by_id(&id))
        .await
        .map_err(join_error)??;

    Ok(Json(to_prefs(row)))
}

pub async fn update_prefs(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(user): Extension<SessionUser>,
    Json(req): Json<UpdatePrefsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    check_owner(&user, &user_id)?;

    // Empty string counts as "not supplied"; anything else must be a real
    // theme name.
    let theme = match req.theme.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Some(
            Theme::from_str(s).ok_or_else(|| ApiError::Validation("invalid theme".into()))?,
        ),
        None => None,
    };

    let db = state.db.clone();
    let id = user_id.clone();
    let theme_str = theme.map(|t| t.as_str());
    let row = tokio::task::spawn_blocking(move || {
        db.update_preferences(&id, theme_str, req.is_anonymous)
    })
    .await
    .map_err(join_error)??;

    Ok(Json(to_prefs(row)))
}

/// A missing row answers with the defaults, matching what a fresh account
/// would report.
fn to_prefs(row: Option<UserRow>) -> Preferences {
    row.map(|row| Preferences {
        theme: row.theme.as_deref().and_then(Theme::from_str),
        is_anonymous: row.is_anonymous,
    })
    .unwrap_or_default()
}
