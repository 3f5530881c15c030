//! Router assembly and serving

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    error::{Error, Result},
    handlers::{auth, kitties},
    state::AppState,
};

/// Build the full application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/auth/register", post(auth::register))
        .route(
            "/api/v1/auth/login",
            post(auth::login).get(auth::check_auth),
        )
        .route(
            "/api/v1/kitties",
            get(kitties::list_kitties).post(kitties::create_kitty),
        )
        .route(
            "/api/v1/kitties/{id}",
            get(kitties::get_kitty).patch(kitties::produce_kitten),
        )
        .fallback(unknown_route)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn unknown_route() -> Error {
    Error::NotFound("Resource not found".to_string())
}

async fn method_not_allowed() -> Error {
    Error::MethodNotAllowed
}

/// Bind and serve until a shutdown signal arrives
pub async fn serve(state: AppState) -> Result<()> {
    let port = state.config().service.port;
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("Listening on port {}", port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Internal(format!("Server error: {e}")))?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
