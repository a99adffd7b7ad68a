use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::{get, put};
use axum::{Json, Router};

use super::evaluation::Evaluation;
use super::program::{
    AdmissionApplicationId, AdmissionApplicationInput, AdmissionApplicationView, AdmissionLog,
    AdmissionSchedule, AdmissionScheduleInput, AdmissionScore, DecisionInput, ProgramCriteria,
    ProgramCriteriaInput, ScoreInput,
};
use super::service::{AdmissionService, CriteriaFilter, ScoringResult};
use super::university::{
    ApplicationFormInput, UniversityAdmissionId, UniversityAdmissionInput,
    UniversityAdmissionView, UniversityApplicationId, UniversityApplicationView,
    UniversityCriteria, UniversityCriteriaInput, UniversityLog, UniversitySchedule,
    UniversityScheduleInput,
};
use super::university_service::{ExamResultInput, UniversityAdmissionService};
use crate::designations::UserId;
use crate::http::{created, ApiResult};
use crate::service::ServiceError;
use crate::store::Store;

/// Program-level schedules, criteria, applications, decisions, and scores.
pub fn admission_router<S>(service: Arc<AdmissionService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route(
            "/api/v1/admission-schedules",
            get(list_schedules::<S>).post(create_schedule::<S>),
        )
        .route(
            "/api/v1/program-criteria",
            get(list_criteria::<S>).post(create_criteria::<S>),
        )
        .route(
            "/api/v1/admission-applications",
            get(list_applications::<S>).post(submit_application::<S>),
        )
        .route(
            "/api/v1/admission-applications/:id",
            get(get_application::<S>),
        )
        .route(
            "/api/v1/admission-applications/:id/logs",
            get(application_logs::<S>).post(record_decision::<S>),
        )
        .route(
            "/api/v1/admission-applications/:id/scores",
            get(application_scores::<S>).put(upsert_scores::<S>),
        )
        .route(
            "/api/v1/admission-applications/:id/evaluation",
            get(application_evaluation::<S>),
        )
        .with_state(service)
}

type Admissions<S> = State<Arc<AdmissionService<S>>>;

async fn list_schedules<S: Store + 'static>(
    State(service): Admissions<S>,
) -> ApiResult<Vec<AdmissionSchedule>> {
    service.schedules().map(Json)
}

async fn create_schedule<S: Store + 'static>(
    State(service): Admissions<S>,
    Json(input): Json<AdmissionScheduleInput>,
) -> Result<Response, ServiceError> {
    service.create_schedule(input).map(created)
}

async fn list_criteria<S: Store + 'static>(
    State(service): Admissions<S>,
    Query(filter): Query<CriteriaFilter>,
) -> ApiResult<Vec<ProgramCriteria>> {
    service.criteria(filter).map(Json)
}

async fn create_criteria<S: Store + 'static>(
    State(service): Admissions<S>,
    Json(input): Json<ProgramCriteriaInput>,
) -> Result<Response, ServiceError> {
    service.create_criteria(input).map(created)
}

async fn list_applications<S: Store + 'static>(
    State(service): Admissions<S>,
) -> ApiResult<Vec<AdmissionApplicationView>> {
    service.applications().map(Json)
}

async fn submit_application<S: Store + 'static>(
    State(service): Admissions<S>,
    Json(input): Json<AdmissionApplicationInput>,
) -> Result<Response, ServiceError> {
    service.submit_application(input).map(created)
}

async fn get_application<S: Store + 'static>(
    State(service): Admissions<S>,
    Path(id): Path<AdmissionApplicationId>,
) -> ApiResult<AdmissionApplicationView> {
    service.application(id).map(Json)
}

async fn application_logs<S: Store + 'static>(
    State(service): Admissions<S>,
    Path(id): Path<AdmissionApplicationId>,
) -> ApiResult<Vec<AdmissionLog>> {
    service.logs(id).map(Json)
}

pub(crate) async fn record_decision<S: Store + 'static>(
    State(service): Admissions<S>,
    Path(id): Path<AdmissionApplicationId>,
    Json(input): Json<DecisionInput>,
) -> Result<Response, ServiceError> {
    service.record_decision(id, input).map(created)
}

async fn application_scores<S: Store + 'static>(
    State(service): Admissions<S>,
    Path(id): Path<AdmissionApplicationId>,
) -> ApiResult<Vec<AdmissionScore>> {
    service.scores(id).map(Json)
}

pub(crate) async fn upsert_scores<S: Store + 'static>(
    State(service): Admissions<S>,
    Path(id): Path<AdmissionApplicationId>,
    Json(inputs): Json<Vec<ScoreInput>>,
) -> ApiResult<ScoringResult> {
    service.upsert_scores(id, inputs).map(Json)
}

async fn application_evaluation<S: Store + 'static>(
    State(service): Admissions<S>,
    Path(id): Path<AdmissionApplicationId>,
) -> ApiResult<Evaluation> {
    service.evaluation(id).map(Json)
}

/// University admission windows, criteria, exam schedules, applications, and invitations.
pub fn university_router<S>(service: Arc<UniversityAdmissionService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route(
            "/api/v1/university-admissions",
            get(list_admissions::<S>).post(create_admission::<S>),
        )
        .route(
            "/api/v1/university-admissions/:id",
            get(get_admission::<S>).put(update_admission::<S>),
        )
        .route(
            "/api/v1/university-admissions/:id/criteria",
            get(admission_criteria::<S>).post(add_admission_criteria::<S>),
        )
        .route(
            "/api/v1/university-admissions/:id/schedules",
            get(admission_schedules::<S>).post(add_admission_schedule::<S>),
        )
        .route(
            "/api/v1/university-admissions/:id/applications",
            get(admission_applications::<S>).post(submit_application_form::<S>),
        )
        .route(
            "/api/v1/university-applications/:id",
            get(get_university_application::<S>),
        )
        .route(
            "/api/v1/university-applications/:id/logs",
            get(university_logs::<S>).post(university_decision::<S>),
        )
        .route(
            "/api/v1/university-applications/:id/result",
            put(record_result::<S>),
        )
        .route(
            "/api/v1/users/:id/admission-invitation",
            get(admission_invitation::<S>),
        )
        .with_state(service)
}

type University<S> = State<Arc<UniversityAdmissionService<S>>>;

async fn list_admissions<S: Store + 'static>(
    State(service): University<S>,
) -> ApiResult<Vec<UniversityAdmissionView>> {
    service.admissions().map(Json)
}

async fn create_admission<S: Store + 'static>(
    State(service): University<S>,
    Json(input): Json<UniversityAdmissionInput>,
) -> Result<Response, ServiceError> {
    service.create_admission(input).map(created)
}

async fn get_admission<S: Store + 'static>(
    State(service): University<S>,
    Path(id): Path<UniversityAdmissionId>,
) -> ApiResult<UniversityAdmissionView> {
    service.admission(id).map(Json)
}

async fn update_admission<S: Store + 'static>(
    State(service): University<S>,
    Path(id): Path<UniversityAdmissionId>,
    Json(input): Json<UniversityAdmissionInput>,
) -> ApiResult<UniversityAdmissionView> {
    service.update_admission(id, input).map(Json)
}

async fn admission_criteria<S: Store + 'static>(
    State(service): University<S>,
    Path(id): Path<UniversityAdmissionId>,
) -> ApiResult<Vec<UniversityCriteria>> {
    service.criteria(id).map(Json)
}

async fn add_admission_criteria<S: Store + 'static>(
    State(service): University<S>,
    Path(id): Path<UniversityAdmissionId>,
    Json(input): Json<UniversityCriteriaInput>,
) -> Result<Response, ServiceError> {
    service.add_criteria(id, input).map(created)
}

async fn admission_schedules<S: Store + 'static>(
    State(service): University<S>,
    Path(id): Path<UniversityAdmissionId>,
) -> ApiResult<Vec<UniversitySchedule>> {
    service.schedules(id).map(Json)
}

async fn add_admission_schedule<S: Store + 'static>(
    State(service): University<S>,
    Path(id): Path<UniversityAdmissionId>,
    Json(input): Json<UniversityScheduleInput>,
) -> Result<Response, ServiceError> {
    service.add_schedule(id, input).map(created)
}

async fn admission_applications<S: Store + 'static>(
    State(service): University<S>,
    Path(id): Path<UniversityAdmissionId>,
) -> ApiResult<Vec<UniversityApplicationView>> {
    service.applications(id).map(Json)
}

async fn submit_application_form<S: Store + 'static>(
    State(service): University<S>,
    Path(id): Path<UniversityAdmissionId>,
    Json(input): Json<ApplicationFormInput>,
) -> Result<Response, ServiceError> {
    service.submit_application_form(id, input).map(created)
}

async fn get_university_application<S: Store + 'static>(
    State(service): University<S>,
    Path(id): Path<UniversityApplicationId>,
) -> ApiResult<UniversityApplicationView> {
    service.application(id).map(Json)
}

async fn university_logs<S: Store + 'static>(
    State(service): University<S>,
    Path(id): Path<UniversityApplicationId>,
) -> ApiResult<Vec<UniversityLog>> {
    service.logs(id).map(Json)
}

async fn university_decision<S: Store + 'static>(
    State(service): University<S>,
    Path(id): Path<UniversityApplicationId>,
    Json(input): Json<DecisionInput>,
) -> Result<Response, ServiceError> {
    service.record_decision(id, input).map(created)
}

async fn record_result<S: Store + 'static>(
    State(service): University<S>,
    Path(id): Path<UniversityApplicationId>,
    Json(input): Json<ExamResultInput>,
) -> ApiResult<UniversityApplicationView> {
    service.record_result(id, input).map(Json)
}

async fn admission_invitation<S: Store + 'static>(
    State(service): University<S>,
    Path(id): Path<UserId>,
) -> ApiResult<Option<UniversityAdmissionView>> {
    service.invitation(id).map(Json)
}
