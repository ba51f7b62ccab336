//! Pulse Web Server
//!
//! Axum-based REST API for the Pulse KPI tracker.
//!
//! Security features:
//! - API key authentication (secure by default, use --no-auth for local dev)
//! - Write endpoints gated on the acting user's role
//! - Restrictive CORS policy
//! - Upload size limits
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use pulse_core::db::Database;
use pulse_core::models::Role;

mod handlers;

/// Maximum workbook upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Header naming the acting user; their stored role gates writes
const ACTING_USER_HEADER: &str = "x-pulse-user";

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only in production)
    pub allowed_origins: Vec<String>,
    /// API keys accepted in the Authorization header ("Bearer <key>")
    pub api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    /// In-flight import sessions awaiting user resolution
    pub import_sessions: handlers::ImportSessionManager,
}

/// Authentication middleware - validates API keys
///
/// API keys are compared using constant-time comparison to prevent timing
/// attacks. This gates access to the API as a whole; per-user write
/// permission is resolved separately from the `x-pulse-user` header against
/// the users table.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(request).await;
    }

    let api_key_valid = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|key| validate_api_key(key, &state.config.api_keys))
        .unwrap_or(false);

    if api_key_valid {
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Unauthorized request - no valid auth");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

/// Validate an API key against the configured keys using constant-time
/// comparison to prevent timing attacks.
fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();

    for key in valid_keys {
        let key_bytes = key.as_bytes();
        // Only compare if lengths match (constant-time for same-length keys)
        if provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes))
        {
            return true;
        }
    }
    false
}

/// Name of the acting user from request headers, for role resolution and logs
pub fn acting_user(headers: &axum::http::HeaderMap) -> String {
    headers
        .get(ACTING_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or("anonymous")
        .to_string()
}

/// Resolve the acting user's role; unknown users are viewers
pub fn acting_role(state: &AppState, headers: &axum::http::HeaderMap) -> Result<Role, AppError> {
    let user = acting_user(headers);
    Ok(state.db.role_for_user(&user)?.unwrap_or(Role::Viewer))
}

/// Require the acting user to hold a write-capable role
pub fn require_writer(
    state: &AppState,
    headers: &axum::http::HeaderMap,
) -> Result<String, AppError> {
    let user = acting_user(headers);
    let role = state.db.role_for_user(&user)?.unwrap_or(Role::Viewer);
    if !role.can_write() {
        return Err(AppError::forbidden("Write access requires the admin role"));
    }
    Ok(user)
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        import_sessions: handlers::ImportSessionManager::new(),
    });

    let api_routes = Router::new()
        // Pillars
        .route(
            "/pillars",
            get(handlers::list_pillars).post(handlers::create_pillar),
        )
        .route(
            "/pillars/:id",
            get(handlers::get_pillar).delete(handlers::delete_pillar),
        )
        // Metrics
        .route(
            "/metrics",
            get(handlers::list_metrics).post(handlers::create_metric),
        )
        .route(
            "/metrics/:id",
            get(handlers::get_metric).delete(handlers::delete_metric),
        )
        // Measurements
        .route("/metrics/:id/measurements", get(handlers::list_measurements))
        .route("/metrics/:id/export", get(handlers::export_measurements))
        .route("/template", get(handlers::export_template))
        // Import reconciliation
        .route("/metrics/:id/import", post(handlers::import_workbook))
        .route("/metrics/:id/import/manual", post(handlers::import_manual))
        .route(
            "/import/:session_id/duplicates",
            post(handlers::resolve_duplicates),
        )
        .route(
            "/import/:session_id/conflicts",
            post(handlers::resolve_conflicts),
        )
        .route("/import/:session_id", delete(handlers::cancel_import))
        // Action plans
        .route(
            "/plans",
            get(handlers::list_action_plans).post(handlers::create_action_plan),
        )
        .route(
            "/plans/:id/status",
            post(handlers::update_action_plan_status),
        )
        .route("/plans/:id", delete(handlers::delete_action_plan))
        .route(
            "/pillars/:id/plan-counts",
            get(handlers::get_action_plan_counts),
        );

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}

/// Start the server
pub async fn serve(db: Database, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(db, host, port, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("⚠️  Authentication disabled - do not expose to network!");
    } else if config.api_keys.is_empty() {
        warn!("⚠️  No API keys configured (set PULSE_API_KEYS); all requests will be rejected");
    }

    let app = create_router(db, config);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Pulse server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn forbidden(msg: &str) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn conflict(msg: &str) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
