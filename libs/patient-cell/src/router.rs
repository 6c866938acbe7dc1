use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn patient_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::register_patient))
        .route("/by-document/{national_id}", get(handlers::get_patient_by_document))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
