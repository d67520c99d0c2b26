use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{ghl_handler, handlers, handlers::AppState, lead_handler};

/// API endpoints, without state or middleware.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Quiz scoring
        .route("/api/quiz/score", post(handlers::score_quiz))
        .route("/api/quiz/report", post(handlers::download_report))
        // Quiz sessions (answer relay between pages)
        .route("/api/quiz/sessions", post(handlers::start_session))
        .route("/api/quiz/sessions/:id", get(handlers::get_session))
        .route(
            "/api/quiz/sessions/:id/answers",
            post(handlers::record_answer),
        )
        .route("/api/quiz/sessions/:id/back", post(handlers::previous_step))
        .route(
            "/api/quiz/sessions/:id/complete",
            post(handlers::complete_session),
        )
        // Lead submission (score + CRM)
        .route("/api/leads", post(lead_handler::submit_lead))
        // GoHighLevel proxy endpoints
        .route("/api/ghl/create-contact", post(ghl_handler::create_contact))
        .route(
            "/api/ghl/create-opportunity",
            post(ghl_handler::create_opportunity),
        )
        .route("/api/ghl/test", get(ghl_handler::test_connection))
        .route("/api/env-check", get(ghl_handler::env_check))
}

/// Full application router without rate limiting or tracing layers.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(api_routes())
        .with_state(state)
}
