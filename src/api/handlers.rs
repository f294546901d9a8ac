//! RPC route handlers.
//!
//! Each handler derives a cancellation token from the server's shutdown
//! token, so in-flight store calls are abandoned when the server stops.
//! A client disconnect drops the handler future, which has the same effect.

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};

use super::dto::{
    GetTemplateRequest, HealthResponse, ListServiceTemplatesRequest, ValidateRequest,
};
use super::error::ApiError;
use super::routes::ApiState;
use crate::tree::{TemplateContent, TemplateListResult, Tree, ValidationResult};

/// Liveness endpoint
pub async fn health_handler() -> (StatusCode, Json<HealthResponse>) {
    (StatusCode::OK, Json(HealthResponse { status: "ok".to_string() }))
}

pub async fn list_service_templates_handler(
    State(state): State<ApiState>,
    payload: Result<Json<ListServiceTemplatesRequest>, JsonRejection>,
) -> Result<Json<TemplateListResult>, ApiError> {
    let Json(request) = payload?;
    let cancel = state.shutdown.child_token();

    let result = state.service.list_service_templates(&request.service, &cancel).await?;
    Ok(Json(result))
}

pub async fn get_template_handler(
    State(state): State<ApiState>,
    payload: Result<Json<GetTemplateRequest>, JsonRejection>,
) -> Result<Json<TemplateContent>, ApiError> {
    let Json(request) = payload?;
    let cancel = state.shutdown.child_token();

    let result = state.service.get_template(&request.service, &request.file, &cancel).await?;
    Ok(Json(result))
}

pub async fn validate_handler(
    State(state): State<ApiState>,
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> Result<Json<ValidationResult>, ApiError> {
    let Json(request) = payload?;
    let cancel = state.shutdown.child_token();

    let result = state.service.validate(&request.service, &request.env, &cancel).await?;
    Ok(Json(result))
}

/// The request body (`{}` in Twirp clients) carries nothing and is not read.
pub async fn get_full_tree_handler(State(state): State<ApiState>) -> Result<Json<Tree>, ApiError> {
    let cancel = state.shutdown.child_token();

    let tree = state.service.get_full_tree(&cancel).await?;
    Ok(Json(tree))
}
