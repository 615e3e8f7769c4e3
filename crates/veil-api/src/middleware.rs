use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use veil_session::cookie;

use crate::auth::AppState;
use crate::error::ApiError;

/// Session check for protected routes: parse the session cookie, verify the
/// token, and stash the proven identity as a request extension. Expired and
/// malformed tokens get the same 401 as a missing cookie.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = cookie::token_from_headers(req.headers())
        .ok_or_else(|| ApiError::Auth("unauthenticated".into()))?;

    let user = state
        .sessions
        .verify(&token)
        .map_err(|_| ApiError::Auth("unauthenticated".into()))?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
