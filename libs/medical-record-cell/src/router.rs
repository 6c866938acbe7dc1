use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn record_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/by-document/{national_id}", get(handlers::get_history_by_document))
        .route("/{patient_id}/consultations", get(handlers::get_patient_consultations))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
