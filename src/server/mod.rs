//! # HTTP Archive Server
//!
//! Builds carousel archives server-side for clients whose local ZIP
//! assembly failed.
//!
//! ## Usage
//!
//! ```bash
//! carousel serve --listen 0.0.0.0:8080
//! ```
//!
//! | Route | Description |
//! |-------|-------------|
//! | `POST /api/carousel/export` | base64 slides in, `carousel-export.zip` out |
//! | `GET /api/health` | liveness |

mod handlers;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::error::CarouselError;

/// Request body limit for the export route.
pub const EXPORT_BODY_LIMIT: usize = 50 * 1024 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Build the application router.
pub fn router() -> Router {
    Router::new()
        .route(
            "/api/carousel/export",
            post(handlers::carousel::export).layer(DefaultBodyLimit::max(EXPORT_BODY_LIMIT)),
        )
        .route("/api/health", get(handlers::health::health))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use carousel::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), carousel::CarouselError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), CarouselError> {
    let listen_addr = config.listen_addr;
    let app = router();

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| CarouselError::Transport(format!("Failed to bind to {}: {}", listen_addr, e)))?;

    tracing::info!(addr = %listen_addr, "carousel archive server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| CarouselError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}
