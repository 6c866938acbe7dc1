use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::create_appointment))
        .route("/search", get(handlers::search_appointments))
        .route("/range", get(handlers::appointments_in_range))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/status", put(handlers::change_status))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
