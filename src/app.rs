use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/rituals", get(handlers::list_rituals).post(handlers::create_ritual))
        .route("/api/rituals/reorder", post(handlers::reorder_rituals))
        .route(
            "/api/rituals/:id",
            put(handlers::update_ritual).delete(handlers::delete_ritual),
        )
        .route("/api/quotas", get(handlers::list_quotas).post(handlers::create_quota))
        .route("/api/quotas/reorder", post(handlers::reorder_quotas))
        .route(
            "/api/quotas/:id",
            put(handlers::update_quota).delete(handlers::delete_quota),
        )
        .route("/api/quotas/:id/tick", post(handlers::tick_quota))
        .route("/api/logs", get(handlers::list_logs).post(handlers::create_log))
        .route("/api/logs/tags", get(handlers::list_tags))
        .route("/api/logs/export", get(handlers::export_logs))
        .route(
            "/api/logs/:id",
            put(handlers::update_log).delete(handlers::delete_log),
        )
        .route("/api/entries", post(handlers::log_entry))
        .route("/api/weeks/current", get(handlers::current_week))
        .route("/api/weeks/:date", get(handlers::get_week).post(handlers::save_week))
        .with_state(state)
}
