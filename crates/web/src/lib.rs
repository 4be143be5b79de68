pub mod flash;
pub mod forms;
pub mod render;
pub mod routes;
pub mod state;

pub use state::{cookie_key, AppState};

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::page_routes())
        .nest("/api", routes::api_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server.
pub async fn start_server(state: AppState, bind_addr: &str) -> anyhow::Result<()> {
    let network = state.network.clone();
    let ready = state.bot.is_some();
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(%network, bot_ready = ready, "Web server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
