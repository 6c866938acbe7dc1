use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/", post(handlers::register_doctor))
        .route("/specialties", get(handlers::list_specialties))
        .route("/by-document/{national_id}", get(handlers::get_doctor_by_document))
        .route("/schedules", post(handlers::create_schedule))
        .route("/schedules/{schedule_id}", put(handlers::update_schedule))
        .route("/schedules/{schedule_id}", delete(handlers::delete_schedule))
        .route("/{doctor_id}/schedule", get(handlers::get_doctor_schedule))
        .route("/{doctor_id}/schedule/available", get(handlers::get_available_slots))
        .route("/{doctor_id}/exceptions", post(handlers::create_exception))
        .route("/{doctor_id}/exceptions/{exception_id}", delete(handlers::delete_exception))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
