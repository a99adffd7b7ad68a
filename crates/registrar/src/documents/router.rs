use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};

use super::{
    DocumentLog, DocumentLogInput, DocumentRequestFilter, DocumentRequestId,
    DocumentRequestInput, DocumentRequestView, DocumentService, DocumentType, DocumentTypeInput,
};
use crate::http::{created, ApiResult};
use crate::service::ServiceError;
use crate::store::Store;

pub fn router<S>(service: Arc<DocumentService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route(
            "/api/v1/document-types",
            get(list_types::<S>).post(create_type::<S>),
        )
        .route(
            "/api/v1/document-requests",
            get(list_requests::<S>).post(submit_request::<S>),
        )
        .route("/api/v1/document-requests/:id", get(get_request::<S>))
        .route(
            "/api/v1/document-requests/:id/logs",
            get(request_logs::<S>).post(record_action::<S>),
        )
        .with_state(service)
}

type Documents<S> = State<Arc<DocumentService<S>>>;

async fn list_types<S: Store + 'static>(
    State(service): Documents<S>,
) -> ApiResult<Vec<DocumentType>> {
    service.types().map(Json)
}

async fn create_type<S: Store + 'static>(
    State(service): Documents<S>,
    Json(input): Json<DocumentTypeInput>,
) -> Result<Response, ServiceError> {
    service.create_type(input).map(created)
}

async fn list_requests<S: Store + 'static>(
    State(service): Documents<S>,
    Query(filter): Query<DocumentRequestFilter>,
) -> ApiResult<Vec<DocumentRequestView>> {
    service.requests(filter).map(Json)
}

async fn submit_request<S: Store + 'static>(
    State(service): Documents<S>,
    Json(input): Json<DocumentRequestInput>,
) -> Result<Response, ServiceError> {
    service.submit(input).map(created)
}

async fn get_request<S: Store + 'static>(
    State(service): Documents<S>,
    Path(id): Path<DocumentRequestId>,
) -> ApiResult<DocumentRequestView> {
    service.request(id).map(Json)
}

async fn request_logs<S: Store + 'static>(
    State(service): Documents<S>,
    Path(id): Path<DocumentRequestId>,
) -> ApiResult<Vec<DocumentLog>> {
    service.logs(id).map(Json)
}

async fn record_action<S: Store + 'static>(
    State(service): Documents<S>,
    Path(id): Path<DocumentRequestId>,
    Json(input): Json<DocumentLogInput>,
) -> Result<Response, ServiceError> {
    service.record(id, input).map(created)
}
