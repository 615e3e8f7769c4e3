//! Wires the REST surface, the gateway, and shared state into one app.
//! `main` reads config from the environment; tests build the same router
//! against an in-memory database.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, WebSocketUpgrade},
    http::{HeaderMap, HeaderValue, Method, header},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use veil_api::auth::{self, AppState, AppStateInner};
use veil_api::error::ApiError;
use veil_api::messages;
use veil_api::middleware::require_session;
use veil_api::prefs;
use veil_db::Database;
use veil_gateway::connection;
use veil_gateway::registry::GroupRegistry;
use veil_session::{Sessions, cookie};

/// Runtime configuration, resolved from the environment with dev-friendly
/// defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: String,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

const DEFAULT_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000,http://localhost:5500,http://127.0.0.1:5500";

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolution with the variable source injected: `from_env` passes the
    /// process environment, tests pass a fixed lookup.
    fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = var("VEIL_JWT_SECRET").unwrap_or_else(|| "dev-secret-change-me".into());
        let db_path = var("VEIL_DB_PATH").unwrap_or_else(|| "veil.db".into());
        let host = var("VEIL_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("VEIL_PORT").unwrap_or_else(|| "3000".into()).parse()?;

        let origins_raw = var("VEIL_ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ORIGINS.into());
        let allowed_origins = origins_raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            jwt_secret,
            db_path,
            host,
            port,
            allowed_origins,
        })
    }
}

pub fn build_state(db: Database, jwt_secret: &str) -> AppState {
    Arc::new(AppStateInner {
        db: Arc::new(db),
        sessions: Sessions::new(jwt_secret),
        registry: GroupRegistry::new(),
    })
}

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let public_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/health", get(health))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/me", get(auth::me))
        .route("/messages/{group_id}", get(messages::history))
        .route("/prefs/{user_id}", get(prefs::get_prefs))
        .route("/prefs/{user_id}", post(prefs::update_prefs))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ))
        .with_state(state.clone());

    let ws_route = Router::new()
        .route("/gateway", get(ws_upgrade))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(ws_route)
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// Credentialed CORS needs an explicit origin allow-list; a wildcard would
/// make browsers drop the session cookie.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// GET /health, liveness check (no auth).
async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

/// Session auth happens at upgrade time: no cookie, no socket. A socket
/// that reaches the connection loop already carries a verified identity.
async fn ws_upgrade(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let token = cookie::token_from_headers(&headers)
        .ok_or_else(|| ApiError::Auth("unauthenticated".into()))?;
    let user = state
        .sessions
        .verify(&token)
        .map_err(|_| ApiError::Auth("unauthenticated".into()))?;

    let registry = state.registry.clone();
    let db = state.db.clone();
    Ok(ws.on_upgrade(move |socket| connection::handle_socket(socket, registry, db, user)))
}
