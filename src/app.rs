use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/api/categories",
            get(handlers::list_categories).post(handlers::add_main_category),
        )
        .route("/api/categories/:main", delete(handlers::delete_main_category))
        .route(
            "/api/categories/:main/subcategories",
            post(handlers::add_subcategory),
        )
        .route(
            "/api/categories/:main/subcategories/:sub",
            put(handlers::update_subcategory).delete(handlers::delete_subcategory),
        )
        .route(
            "/api/categories/:main/suggestions",
            get(handlers::suggest_subcategories),
        )
        .route("/api/stats/:window", get(handlers::get_stats))
        .route("/api/stats/:window/keys/:key", get(handlers::get_key_stats))
        .route("/api/totals", get(handlers::get_totals))
        .route("/api/export/:window", get(handlers::export_stats))
        .route("/api/calls", post(handlers::log_call))
        .route(
            "/api/undo",
            get(handlers::get_undo).post(handlers::apply_undo),
        )
        .route(
            "/api/custom-fields",
            get(handlers::list_custom_fields).post(handlers::add_custom_field),
        )
        .route(
            "/api/custom-fields/:index",
            delete(handlers::delete_custom_field),
        )
        .route("/api/stopwatch", get(handlers::get_stopwatch))
        .route("/api/stopwatch/start", post(handlers::start_stopwatch))
        .route("/api/stopwatch/pause", post(handlers::pause_stopwatch))
        .route("/api/stopwatch/reset", post(handlers::reset_stopwatch))
        .route(
            "/api/stopwatch/history/:index",
            delete(handlers::delete_stopwatch_entry),
        )
        .route("/api/summary", post(handlers::summary))
        .route("/api/notices", get(handlers::take_notices))
        .with_state(state)
}
