use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::header, response::IntoResponse};
use serde_json::json;
use uuid::Uuid;

use veil_db::{Database, is_unique_violation};
use veil_gateway::registry::GroupRegistry;
use veil_session::{SessionUser, Sessions, cookie};
use veil_types::api::{LoginRequest, SignupRequest, UserResponse};

use crate::error::{ApiError, join_error};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub sessions: Sessions,
    pub registry: GroupRegistry,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.is_empty() || req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation("name, email, password required".into()));
    }

    let db = state.db.clone();
    let email = req.email.clone();
    let existing = tokio::task::spawn_blocking(move || db.get_user_by_email(&email))
        .await
        .map_err(join_error)??;
    if existing.is_some() {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user_id = Uuid::new_v4();

    let db = state.db.clone();
    let (name, email) = (req.name.clone(), req.email.clone());
    let created = tokio::task::spawn_blocking(move || {
        db.create_user(&user_id.to_string(), &name, &email, &password_hash)
    })
    .await
    .map_err(join_error)?;

    if let Err(e) = created {
        // The unique index catches a concurrent signup racing the existence
        // check above.
        if is_unique_violation(&e) {
            return Err(ApiError::Conflict("Email already registered".into()));
        }
        return Err(e.into());
    }

    // The store lowercases emails; the session and response echo that form.
    let user = SessionUser {
        id: user_id,
        name: req.name,
        email: req.email.to_lowercase(),
    };
    let token = state.sessions.issue(&user)?;

    Ok((
        [(header::SET_COOKIE, cookie::session_cookie(&token))],
        Json(UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation("email, password required".into()));
    }

    let db = state.db.clone();
    let email = req.email.clone();
    let user = tokio::task::spawn_blocking(move || db.get_user_by_email(&email))
        .await
        .map_err(join_error)??
        .ok_or_else(|| ApiError::Auth("Invalid credentials".into()))?;

    if !verify_password(&req.password, &user.password)? {
        return Err(ApiError::Auth("Invalid credentials".into()));
    }

    let id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {}", user.id, e))?;

    let session_user = SessionUser {
        id,
        name: user.name,
        email: user.email,
    };
    let token = state.sessions.issue(&session_user)?;

    Ok((
        [(header::SET_COOKIE, cookie::session_cookie(&token))],
        Json(UserResponse {
            id,
            name: session_user.name,
            email: session_user.email,
        }),
    ))
}

/// Clears the cookie and nothing else; tokens stay valid until they expire,
/// so this succeeds even without a session.
pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, cookie::clear_cookie())],
        Json(json!({ "ok": true })),
    )
}

/// Current identity. The token alone is not proof the account still
/// exists, so the store is consulted before answering.
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let id = user.id.to_string();
    let row = tokio::task::spawn_blocking(move || db.get_user_by_id(&id))
        .await
        .map_err(join_error)??
        .ok_or_else(|| ApiError::Auth("unauthenticated".into()))?;

    let id: Uuid = row
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {}", row.id, e))?;

    Ok(Json(UserResponse {
        id,
        name: row.name,
        email: row.email,
    }))
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hash failed: {}", e))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| anyhow::anyhow!("stored password hash unreadable: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hash = hash_password("hunter2345").unwrap();
        assert_ne!(hash, "hunter2345");
        assert!(verify_password("hunter2345", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }
}
