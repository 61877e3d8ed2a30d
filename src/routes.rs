use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/api/health", get(handlers::health_check))
        .route("/api/languages", get(handlers::list_languages))

        // Home screen
        .route("/api/translate", post(handlers::translate))
        .route("/api/translate/:client_id", delete(handlers::cancel_translation))
        .route("/api/swap", post(handlers::swap_languages))
        .route("/api/share", post(handlers::share_translation))

        // History screen
        .route(
            "/api/history",
            get(handlers::get_history).delete(handlers::clear_history),
        )
        .route("/api/history/:id", delete(handlers::delete_translation))
        .route("/api/history/:id/share", get(handlers::share_history_item))
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
