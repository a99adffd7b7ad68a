use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::{
    FinalGradeEntry, FinalGradeSheet, GradeBookFilter, GradeBookId, GradeBookInput,
    GradeBookService, GradeBookView, InstantiateInput, PeriodGradeEntry, PeriodGradeSheet,
    ScoreEntry, ScoreSheet,
};
use crate::academics::SectionId;
use crate::http::{created, no_content, ApiResult};
use crate::service::ServiceError;
use crate::store::Store;

pub fn router<S>(service: Arc<GradeBookService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route(
            "/api/v1/gradebooks",
            get(list_gradebooks::<S>).post(create_gradebook::<S>),
        )
        .route(
            "/api/v1/gradebooks/:id",
            get(get_gradebook::<S>).delete(delete_gradebook::<S>),
        )
        .route(
            "/api/v1/gradebooks/:id/instantiate",
            post(instantiate_template::<S>),
        )
        .route("/api/v1/sections/:id/gradebook", get(section_gradebook::<S>))
        .route(
            "/api/v1/sections/:id/scores",
            get(score_sheet::<S>).put(sync_scores::<S>),
        )
        .route(
            "/api/v1/sections/:id/period-grades",
            get(period_grade_sheet::<S>).put(sync_period_grades::<S>),
        )
        .route(
            "/api/v1/sections/:id/final-grades",
            get(final_grade_sheet::<S>).put(sync_final_grades::<S>),
        )
        .with_state(service)
}

type GradeBooks<S> = State<Arc<GradeBookService<S>>>;

async fn list_gradebooks<S: Store + 'static>(
    State(service): GradeBooks<S>,
    Query(filter): Query<GradeBookFilter>,
) -> ApiResult<Vec<GradeBookView>> {
    service.gradebooks(filter).map(Json)
}

async fn create_gradebook<S: Store + 'static>(
    State(service): GradeBooks<S>,
    Json(input): Json<GradeBookInput>,
) -> Result<Response, ServiceError> {
    service.create(input).map(created)
}

async fn get_gradebook<S: Store + 'static>(
    State(service): GradeBooks<S>,
    Path(id): Path<GradeBookId>,
) -> ApiResult<GradeBookView> {
    service.gradebook(id).map(Json)
}

async fn delete_gradebook<S: Store + 'static>(
    State(service): GradeBooks<S>,
    Path(id): Path<GradeBookId>,
) -> Result<Response, ServiceError> {
    service.delete(id).map(|()| no_content())
}

async fn instantiate_template<S: Store + 'static>(
    State(service): GradeBooks<S>,
    Path(id): Path<GradeBookId>,
    Json(input): Json<InstantiateInput>,
) -> Result<Response, ServiceError> {
    service.instantiate_template(id, input).map(created)
}

async fn section_gradebook<S: Store + 'static>(
    State(service): GradeBooks<S>,
    Path(section): Path<SectionId>,
) -> ApiResult<GradeBookView> {
    service.section_gradebook(section).map(Json)
}

async fn score_sheet<S: Store + 'static>(
    State(service): GradeBooks<S>,
    Path(section): Path<SectionId>,
) -> ApiResult<ScoreSheet> {
    service.score_sheet(section).map(Json)
}

async fn sync_scores<S: Store + 'static>(
    State(service): GradeBooks<S>,
    Path(section): Path<SectionId>,
    Json(entries): Json<Vec<ScoreEntry>>,
) -> ApiResult<ScoreSheet> {
    service.sync_scores(section, entries).map(Json)
}

async fn period_grade_sheet<S: Store + 'static>(
    State(service): GradeBooks<S>,
    Path(section): Path<SectionId>,
) -> ApiResult<PeriodGradeSheet> {
    service.period_grade_sheet(section).map(Json)
}

async fn sync_period_grades<S: Store + 'static>(
    State(service): GradeBooks<S>,
    Path(section): Path<SectionId>,
    Json(entries): Json<Vec<PeriodGradeEntry>>,
) -> ApiResult<PeriodGradeSheet> {
    service.sync_period_grades(section, entries).map(Json)
}

async fn final_grade_sheet<S: Store + 'static>(
    State(service): GradeBooks<S>,
    Path(section): Path<SectionId>,
) -> ApiResult<FinalGradeSheet> {
    service.final_grade_sheet(section).map(Json)
}

async fn sync_final_grades<S: Store + 'static>(
    State(service): GradeBooks<S>,
    Path(section): Path<SectionId>,
    Json(entries): Json<Vec<FinalGradeEntry>>,
) -> ApiResult<FinalGradeSheet> {
    service.sync_final_grades(section, entries).map(Json)
}
