use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use super::handlers::{
    get_full_tree_handler, get_template_handler, health_handler, list_service_templates_handler,
    validate_handler,
};
use crate::services::SecretTreeService;

/// Route prefix shared by every RPC method.
pub const SERVICE_PATH: &str = "/twirp/keytree.v1.SecretTree";

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<SecretTreeService>,

    /// Cancelled when the server begins shutting down
    pub shutdown: CancellationToken,
}

impl ApiState {
    pub fn new(service: Arc<SecretTreeService>) -> Self {
        Self { service, shutdown: CancellationToken::new() }
    }
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            &format!("{}/ListServiceTemplates", SERVICE_PATH),
            post(list_service_templates_handler),
        )
        .route(&format!("{}/GetTemplate", SERVICE_PATH), post(get_template_handler))
        .route(&format!("{}/Validate", SERVICE_PATH), post(validate_handler))
        .route(&format!("{}/GetFullTree", SERVICE_PATH), post(get_full_tree_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
