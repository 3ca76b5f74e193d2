use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/grid", get(handlers::get_grid))
        .route("/api/toggle", post(handlers::toggle))
        .route("/api/export", get(handlers::export))
        .route("/api/import", post(handlers::import))
        .route("/api/refresh", post(handlers::refresh))
        .route("/api/preferences", get(handlers::get_preferences).post(handlers::set_preferences))
        .fallback(handlers::static_file)
        .with_state(state)
}
