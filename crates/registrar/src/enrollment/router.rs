use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};

use super::service::EnrollmentFilter;
use super::{EnrollmentId, EnrollmentInput, EnrollmentLog, EnrollmentLogInput, EnrollmentService, EnrollmentView};
use crate::http::{created, ApiResult};
use crate::service::ServiceError;
use crate::store::Store;

pub fn router<S>(service: Arc<EnrollmentService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route(
            "/api/v1/enrollments",
            get(list_enrollments::<S>).post(enroll::<S>),
        )
        .route("/api/v1/enrollments/:id", get(get_enrollment::<S>))
        .route(
            "/api/v1/enrollments/:id/logs",
            get(enrollment_logs::<S>).post(record_action::<S>),
        )
        .with_state(service)
}

type Enrollments<S> = State<Arc<EnrollmentService<S>>>;

async fn list_enrollments<S: Store + 'static>(
    State(service): Enrollments<S>,
    Query(filter): Query<EnrollmentFilter>,
) -> ApiResult<Vec<EnrollmentView>> {
    service.enrollments(filter).map(Json)
}

async fn enroll<S: Store + 'static>(
    State(service): Enrollments<S>,
    Json(input): Json<EnrollmentInput>,
) -> Result<Response, ServiceError> {
    service.enroll(input).map(created)
}

async fn get_enrollment<S: Store + 'static>(
    State(service): Enrollments<S>,
    Path(id): Path<EnrollmentId>,
) -> ApiResult<EnrollmentView> {
    service.enrollment(id).map(Json)
}

async fn enrollment_logs<S: Store + 'static>(
    State(service): Enrollments<S>,
    Path(id): Path<EnrollmentId>,
) -> ApiResult<Vec<EnrollmentLog>> {
    service.logs(id).map(Json)
}

async fn record_action<S: Store + 'static>(
    State(service): Enrollments<S>,
    Path(id): Path<EnrollmentId>,
    Json(input): Json<EnrollmentLogInput>,
) -> Result<Response, ServiceError> {
    service.record(id, input).map(created)
}
