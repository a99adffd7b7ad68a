use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;

use super::{
    Designation, DesignationId, DesignationInput, DesignationService, FamilyMember, FamilyMemberId,
    FamilyMemberInput, Role, User, UserId, UserInput,
};
use crate::academics::AcademicProgramId;
use crate::http::{created, no_content, ApiResult};
use crate::service::ServiceError;
use crate::store::Store;

pub fn router<S>(service: Arc<DesignationService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route("/api/v1/users", get(list_users::<S>).post(create_user::<S>))
        .route("/api/v1/users/:id", get(get_user::<S>))
        .route("/api/v1/users/:id/roles", get(user_roles::<S>))
        .route(
            "/api/v1/users/:id/designations",
            get(list_designations::<S>).post(designate::<S>),
        )
        .route(
            "/api/v1/designations/:id",
            put(set_designation_active::<S>).delete(revoke_designation::<S>),
        )
        .route(
            "/api/v1/users/:id/chaired-programs",
            get(chaired_programs::<S>),
        )
        .route(
            "/api/v1/users/:id/family-background",
            get(family_background::<S>).post(add_family_member::<S>),
        )
        .route(
            "/api/v1/family-background/:id",
            put(update_family_member::<S>).delete(remove_family_member::<S>),
        )
        .with_state(service)
}

type Designations<S> = State<Arc<DesignationService<S>>>;

#[derive(Debug, Deserialize)]
struct ActivationInput {
    is_active: bool,
}

async fn list_users<S: Store + 'static>(State(service): Designations<S>) -> ApiResult<Vec<User>> {
    service.users().map(Json)
}

async fn create_user<S: Store + 'static>(
    State(service): Designations<S>,
    Json(input): Json<UserInput>,
) -> Result<Response, ServiceError> {
    service.create_user(input).map(created)
}

async fn get_user<S: Store + 'static>(
    State(service): Designations<S>,
    Path(id): Path<UserId>,
) -> ApiResult<User> {
    service.user(id).map(Json)
}

async fn user_roles<S: Store + 'static>(
    State(service): Designations<S>,
    Path(id): Path<UserId>,
) -> ApiResult<Vec<Role>> {
    service.roles(id).map(Json)
}

async fn list_designations<S: Store + 'static>(
    State(service): Designations<S>,
    Path(id): Path<UserId>,
) -> ApiResult<Vec<Designation>> {
    service.designations(id).map(Json)
}

async fn designate<S: Store + 'static>(
    State(service): Designations<S>,
    Path(id): Path<UserId>,
    Json(input): Json<DesignationInput>,
) -> Result<Response, ServiceError> {
    service.designate(id, input).map(created)
}

async fn set_designation_active<S: Store + 'static>(
    State(service): Designations<S>,
    Path(id): Path<DesignationId>,
    Json(input): Json<ActivationInput>,
) -> ApiResult<Designation> {
    service.set_active(id, input.is_active).map(Json)
}

async fn revoke_designation<S: Store + 'static>(
    State(service): Designations<S>,
    Path(id): Path<DesignationId>,
) -> Result<Response, ServiceError> {
    service.revoke(id).map(|_| no_content())
}

async fn chaired_programs<S: Store + 'static>(
    State(service): Designations<S>,
    Path(id): Path<UserId>,
) -> ApiResult<Vec<AcademicProgramId>> {
    service.chaired_programs(id).map(Json)
}

async fn family_background<S: Store + 'static>(
    State(service): Designations<S>,
    Path(id): Path<UserId>,
) -> ApiResult<Vec<FamilyMember>> {
    service.family_background(id).map(Json)
}

async fn add_family_member<S: Store + 'static>(
    State(service): Designations<S>,
    Path(id): Path<UserId>,
    Json(input): Json<FamilyMemberInput>,
) -> Result<Response, ServiceError> {
    service.add_family_member(id, input).map(created)
}

async fn update_family_member<S: Store + 'static>(
    State(service): Designations<S>,
    Path(id): Path<FamilyMemberId>,
    Json(input): Json<FamilyMemberInput>,
) -> ApiResult<FamilyMember> {
    service.update_family_member(id, input).map(Json)
}

async fn remove_family_member<S: Store + 'static>(
    State(service): Designations<S>,
    Path(id): Path<FamilyMemberId>,
) -> Result<Response, ServiceError> {
    service.remove_family_member(id).map(|_| no_content())
}
