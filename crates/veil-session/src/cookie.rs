//! Session cookie handling, shared by the HTTP middleware and the gateway
//! WebSocket handshake so both sides parse the header the same way.

use axum::http::{HeaderMap, header};

pub const COOKIE_NAME: &str = "token";

/// Matches the session TTL: 7 days, in seconds.
const MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// Render the `Set-Cookie` value carrying a freshly issued session token.
/// HttpOnly and SameSite=Lax; not marked Secure so plain-http dev setups
/// keep working (production deployments should sit behind TLS).
pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        COOKIE_NAME, token, MAX_AGE_SECS
    )
}

/// Render the `Set-Cookie` value that clears the session cookie.
pub fn clear_cookie() -> String {
    format!(
        "{}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax",
        COOKIE_NAME
    )
}

/// Extract the session token from a request's `Cookie` header, if present.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_value(raw, COOKIE_NAME)
}

/// Find a named cookie in a raw `Cookie` header value.
pub fn cookie_value(raw: &str, name: &str) -> Option<String> {
    raw.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        if k == name { Some(v.to_string()) } else { None }
    })
}
