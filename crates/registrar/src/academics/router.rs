use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};

use super::calendar::{CalendarEntry, CalendarEntryId, CalendarEntryInput};
use super::catalog::{CatalogImportSummary, CourseCatalog};
use super::curriculum::{
    CourseId, CourseInput, CourseRequisiteId, CourseRequisiteInput, CourseView, Curriculum,
    CurriculumDetailId, CurriculumDetailInput, CurriculumId, CurriculumInput,
    CurriculumTaggingView,
};
use super::school_year::{SchoolYearId, SchoolYearInput, SchoolYearView};
use super::section_service::{SectionFilter, SectionService};
use super::sections::{
    GenerateSectionsInput, ScheduleAssignmentId, ScheduleAssignmentInput, SectionId,
    SectionTeacherId, SectionTeacherInput, SectionView,
};
use super::service::{AcademicService, CurriculumView};
use super::structure::*;
use crate::designations::UserId;
use crate::http::{created, no_content, ApiResult};
use crate::service::{RuleViolation, ServiceError};
use crate::store::Store;

/// School years, calendars, reference tables, courses, and curricula.
pub fn academic_router<S>(service: Arc<AcademicService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route(
            "/api/v1/school-years",
            get(list_school_years::<S>).post(create_school_year::<S>),
        )
        .route("/api/v1/active-school-year", get(active_school_year::<S>))
        .route(
            "/api/v1/school-years/:id",
            get(get_school_year::<S>)
                .put(update_school_year::<S>)
                .delete(delete_school_year::<S>),
        )
        .route(
            "/api/v1/school-years/:id/calendar",
            get(school_year_calendar::<S>).post(add_calendar_entry::<S>),
        )
        .route(
            "/api/v1/calendar-events/:id",
            put(update_calendar_entry::<S>).delete(delete_calendar_entry::<S>),
        )
        .route(
            "/api/v1/campuses",
            get(list_campuses::<S>).post(create_campus::<S>),
        )
        .route("/api/v1/campuses/:id", get(get_campus::<S>))
        .route(
            "/api/v1/buildings",
            get(list_buildings::<S>).post(create_building::<S>),
        )
        .route("/api/v1/buildings/:id", get(get_building::<S>))
        .route("/api/v1/rooms", get(list_rooms::<S>).post(create_room::<S>))
        .route("/api/v1/rooms/:id", get(get_room::<S>))
        .route(
            "/api/v1/colleges",
            get(list_colleges::<S>).post(create_college::<S>),
        )
        .route("/api/v1/colleges/:id", get(get_college::<S>))
        .route(
            "/api/v1/program-types",
            get(list_program_types::<S>).post(create_program_type::<S>),
        )
        .route("/api/v1/program-types/:id", get(get_program_type::<S>))
        .route(
            "/api/v1/programs",
            get(list_programs::<S>).post(create_program::<S>),
        )
        .route("/api/v1/programs/:id", get(get_program::<S>))
        .route(
            "/api/v1/programs/:id/requirements",
            get(list_program_requirements::<S>),
        )
        .route(
            "/api/v1/program-requirements",
            post(attach_program_requirement::<S>),
        )
        .route(
            "/api/v1/academic-terms",
            get(list_academic_terms::<S>).post(create_academic_term::<S>),
        )
        .route("/api/v1/academic-terms/:id", get(get_academic_term::<S>))
        .route(
            "/api/v1/requirements",
            get(list_requirements::<S>).post(create_requirement::<S>),
        )
        .route("/api/v1/requirements/:id", get(get_requirement::<S>))
        .route(
            "/api/v1/testing-centers",
            get(list_testing_centers::<S>).post(create_testing_center::<S>),
        )
        .route("/api/v1/testing-centers/:id", get(get_testing_center::<S>))
        .route(
            "/api/v1/courses",
            get(list_courses::<S>).post(create_course::<S>),
        )
        .route("/api/v1/courses/import", post(import_courses::<S>))
        .route("/api/v1/courses/:id", get(get_course::<S>))
        .route("/api/v1/courses/:id/requisites", post(add_requisite::<S>))
        .route(
            "/api/v1/course-requisites/:id",
            delete(remove_requisite::<S>),
        )
        .route(
            "/api/v1/curriculums",
            get(list_curriculums::<S>).post(create_curriculum::<S>),
        )
        .route("/api/v1/curriculums/:id", get(get_curriculum::<S>))
        .route(
            "/api/v1/curriculums/:id/details",
            post(add_curriculum_detail::<S>),
        )
        .route(
            "/api/v1/curriculum-details/:id",
            delete(remove_curriculum_detail::<S>),
        )
        .route(
            "/api/v1/users/:id/curriculum-taggings",
            get(curriculum_taggings::<S>),
        )
        .with_state(service)
}

type Academic<S> = State<Arc<AcademicService<S>>>;

async fn list_school_years<S: Store + 'static>(
    State(service): Academic<S>,
) -> ApiResult<Vec<SchoolYearView>> {
    service.list_school_years().map(Json)
}

async fn active_school_year<S: Store + 'static>(
    State(service): Academic<S>,
) -> ApiResult<Option<SchoolYearView>> {
    service.active_school_year().map(Json)
}

async fn create_school_year<S: Store + 'static>(
    State(service): Academic<S>,
    Json(input): Json<SchoolYearInput>,
) -> Result<Response, ServiceError> {
    service.create_school_year(input).map(created)
}

async fn get_school_year<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<SchoolYearId>,
) -> ApiResult<SchoolYearView> {
    service.school_year(id).map(Json)
}

async fn update_school_year<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<SchoolYearId>,
    Json(input): Json<SchoolYearInput>,
) -> ApiResult<SchoolYearView> {
    service.update_school_year(id, input).map(Json)
}

async fn delete_school_year<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<SchoolYearId>,
) -> Result<Response, ServiceError> {
    service.delete_school_year(id).map(|_| no_content())
}

async fn school_year_calendar<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<SchoolYearId>,
) -> ApiResult<Vec<CalendarEntry>> {
    service.calendar(id).map(Json)
}

async fn add_calendar_entry<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<SchoolYearId>,
    Json(input): Json<CalendarEntryInput>,
) -> Result<Response, ServiceError> {
    service.add_calendar_entry(id, input).map(created)
}

async fn update_calendar_entry<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<CalendarEntryId>,
    Json(input): Json<CalendarEntryInput>,
) -> ApiResult<CalendarEntry> {
    service.update_calendar_entry(id, input).map(Json)
}

async fn delete_calendar_entry<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<CalendarEntryId>,
) -> Result<Response, ServiceError> {
    service.delete_calendar_entry(id).map(|_| no_content())
}

async fn get_campus<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<CampusId>,
) -> ApiResult<Campus> {
    service.campus(id).map(Json)
}

async fn get_building<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<BuildingId>,
) -> ApiResult<Building> {
    service.building(id).map(Json)
}

async fn get_room<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<RoomId>,
) -> ApiResult<Room> {
    service.room(id).map(Json)
}

async fn get_college<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<CollegeId>,
) -> ApiResult<College> {
    service.college(id).map(Json)
}

async fn get_program_type<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<ProgramTypeId>,
) -> ApiResult<ProgramType> {
    service.program_type(id).map(Json)
}

async fn get_program<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<AcademicProgramId>,
) -> ApiResult<AcademicProgram> {
    service.program(id).map(Json)
}

async fn get_academic_term<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<AcademicTermId>,
) -> ApiResult<AcademicTerm> {
    service.academic_term(id).map(Json)
}

async fn get_requirement<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<RequirementId>,
) -> ApiResult<Requirement> {
    service.requirement(id).map(Json)
}

async fn get_testing_center<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<TestingCenterId>,
) -> ApiResult<TestingCenter> {
    service.testing_center(id).map(Json)
}

async fn list_campuses<S: Store + 'static>(State(service): Academic<S>) -> ApiResult<Vec<Campus>> {
    service.campuses().map(Json)
}

async fn create_campus<S: Store + 'static>(
    State(service): Academic<S>,
    Json(input): Json<CampusInput>,
) -> Result<Response, ServiceError> {
    service.create_campus(input).map(created)
}

async fn list_buildings<S: Store + 'static>(
    State(service): Academic<S>,
) -> ApiResult<Vec<Building>> {
    service.buildings().map(Json)
}

async fn create_building<S: Store + 'static>(
    State(service): Academic<S>,
    Json(input): Json<BuildingInput>,
) -> Result<Response, ServiceError> {
    service.create_building(input).map(created)
}

async fn list_rooms<S: Store + 'static>(State(service): Academic<S>) -> ApiResult<Vec<Room>> {
    service.rooms().map(Json)
}

async fn create_room<S: Store + 'static>(
    State(service): Academic<S>,
    Json(input): Json<RoomInput>,
) -> Result<Response, ServiceError> {
    service.create_room(input).map(created)
}

async fn list_colleges<S: Store + 'static>(State(service): Academic<S>) -> ApiResult<Vec<College>> {
    service.colleges().map(Json)
}

async fn create_college<S: Store + 'static>(
    State(service): Academic<S>,
    Json(input): Json<CollegeInput>,
) -> Result<Response, ServiceError> {
    service.create_college(input).map(created)
}

async fn list_program_types<S: Store + 'static>(
    State(service): Academic<S>,
) -> ApiResult<Vec<ProgramType>> {
    service.program_types().map(Json)
}

async fn create_program_type<S: Store + 'static>(
    State(service): Academic<S>,
    Json(input): Json<ProgramTypeInput>,
) -> Result<Response, ServiceError> {
    service.create_program_type(input).map(created)
}

async fn list_programs<S: Store + 'static>(
    State(service): Academic<S>,
) -> ApiResult<Vec<AcademicProgram>> {
    service.programs().map(Json)
}

async fn create_program<S: Store + 'static>(
    State(service): Academic<S>,
    Json(input): Json<AcademicProgramInput>,
) -> Result<Response, ServiceError> {
    service.create_program(input).map(created)
}

async fn list_program_requirements<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<AcademicProgramId>,
) -> ApiResult<Vec<ProgramRequirement>> {
    service.program_requirements(id).map(Json)
}

async fn attach_program_requirement<S: Store + 'static>(
    State(service): Academic<S>,
    Json(input): Json<ProgramRequirementInput>,
) -> Result<Response, ServiceError> {
    service.attach_program_requirement(input).map(created)
}

async fn list_academic_terms<S: Store + 'static>(
    State(service): Academic<S>,
) -> ApiResult<Vec<AcademicTerm>> {
    service.academic_terms().map(Json)
}

async fn create_academic_term<S: Store + 'static>(
    State(service): Academic<S>,
    Json(input): Json<AcademicTermInput>,
) -> Result<Response, ServiceError> {
    service.create_academic_term(input).map(created)
}

async fn list_requirements<S: Store + 'static>(
    State(service): Academic<S>,
) -> ApiResult<Vec<Requirement>> {
    service.requirements().map(Json)
}

async fn create_requirement<S: Store + 'static>(
    State(service): Academic<S>,
    Json(input): Json<RequirementInput>,
) -> Result<Response, ServiceError> {
    service.create_requirement(input).map(created)
}

async fn list_testing_centers<S: Store + 'static>(
    State(service): Academic<S>,
) -> ApiResult<Vec<TestingCenter>> {
    service.testing_centers().map(Json)
}

async fn create_testing_center<S: Store + 'static>(
    State(service): Academic<S>,
    Json(input): Json<TestingCenterInput>,
) -> Result<Response, ServiceError> {
    service.create_testing_center(input).map(created)
}

async fn list_courses<S: Store + 'static>(
    State(service): Academic<S>,
) -> ApiResult<Vec<CourseView>> {
    service.courses().map(Json)
}

async fn create_course<S: Store + 'static>(
    State(service): Academic<S>,
    Json(input): Json<CourseInput>,
) -> Result<Response, ServiceError> {
    service.create_course(input).map(created)
}

/// Accepts the catalog CSV as the raw request body.
async fn import_courses<S: Store + 'static>(
    State(service): Academic<S>,
    body: String,
) -> ApiResult<CatalogImportSummary> {
    let inputs = CourseCatalog::from_reader(body.as_bytes())
        .map_err(|err| RuleViolation::invalid("catalog", err.to_string()))?;
    service.import_courses(inputs).map(Json)
}

async fn get_course<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<CourseId>,
) -> ApiResult<CourseView> {
    service.course(id).map(Json)
}

async fn add_requisite<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<CourseId>,
    Json(input): Json<CourseRequisiteInput>,
) -> Result<Response, ServiceError> {
    service.add_requisite(id, input).map(created)
}

async fn remove_requisite<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<CourseRequisiteId>,
) -> Result<Response, ServiceError> {
    service.remove_requisite(id).map(|_| no_content())
}

async fn list_curriculums<S: Store + 'static>(
    State(service): Academic<S>,
) -> ApiResult<Vec<Curriculum>> {
    service.curriculums().map(Json)
}

async fn create_curriculum<S: Store + 'static>(
    State(service): Academic<S>,
    Json(input): Json<CurriculumInput>,
) -> Result<Response, ServiceError> {
    service.create_curriculum(input).map(created)
}

async fn get_curriculum<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<CurriculumId>,
) -> ApiResult<CurriculumView> {
    service.curriculum(id).map(Json)
}

async fn add_curriculum_detail<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<CurriculumId>,
    Json(input): Json<CurriculumDetailInput>,
) -> Result<Response, ServiceError> {
    service.add_curriculum_detail(id, input).map(created)
}

async fn remove_curriculum_detail<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<CurriculumDetailId>,
) -> Result<Response, ServiceError> {
    service.remove_curriculum_detail(id).map(|_| no_content())
}

async fn curriculum_taggings<S: Store + 'static>(
    State(service): Academic<S>,
    Path(id): Path<UserId>,
) -> ApiResult<Vec<CurriculumTaggingView>> {
    service.curriculum_taggings(id).map(Json)
}

/// Section generation, lookup, schedules, and teachers.
pub fn section_router<S>(service: Arc<SectionService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route("/api/v1/sections", get(list_sections::<S>))
        .route("/api/v1/sections/generate", post(generate_sections::<S>))
        .route("/api/v1/sections/:id", get(get_section::<S>))
        .route("/api/v1/sections/:id/post", post(post_section::<S>))
        .route("/api/v1/sections/:id/schedules", post(add_schedule::<S>))
        .route("/api/v1/sections/:id/teachers", post(assign_teacher::<S>))
        .route(
            "/api/v1/section-codes/:code",
            delete(delete_sections_by_code::<S>),
        )
        .route("/api/v1/schedules/:id", delete(remove_schedule::<S>))
        .route("/api/v1/section-teachers/:id", delete(remove_teacher::<S>))
        .with_state(service)
}

type Sections<S> = State<Arc<SectionService<S>>>;

async fn list_sections<S: Store + 'static>(
    State(service): Sections<S>,
    Query(filter): Query<SectionFilter>,
) -> ApiResult<Vec<SectionView>> {
    service.sections(filter).map(Json)
}

async fn generate_sections<S: Store + 'static>(
    State(service): Sections<S>,
    Json(input): Json<GenerateSectionsInput>,
) -> Result<Response, ServiceError> {
    service.generate(input).map(created)
}

async fn get_section<S: Store + 'static>(
    State(service): Sections<S>,
    Path(id): Path<SectionId>,
) -> ApiResult<SectionView> {
    service.section(id).map(Json)
}

async fn post_section<S: Store + 'static>(
    State(service): Sections<S>,
    Path(id): Path<SectionId>,
) -> ApiResult<SectionView> {
    service.set_posted(id, true).map(Json)
}

async fn add_schedule<S: Store + 'static>(
    State(service): Sections<S>,
    Path(id): Path<SectionId>,
    Json(input): Json<ScheduleAssignmentInput>,
) -> Result<Response, ServiceError> {
    service.add_schedule(id, input).map(created)
}

async fn assign_teacher<S: Store + 'static>(
    State(service): Sections<S>,
    Path(id): Path<SectionId>,
    Json(input): Json<SectionTeacherInput>,
) -> Result<Response, ServiceError> {
    service.assign_teacher(id, input).map(created)
}

async fn delete_sections_by_code<S: Store + 'static>(
    State(service): Sections<S>,
    Path(code): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let removed = service.delete_by_code(&code)?;
    Ok(Json(serde_json::json!({ "section_code": code, "removed": removed })))
}

async fn remove_schedule<S: Store + 'static>(
    State(service): Sections<S>,
    Path(id): Path<ScheduleAssignmentId>,
) -> Result<Response, ServiceError> {
    service.remove_schedule(id).map(|_| no_content())
}

async fn remove_teacher<S: Store + 'static>(
    State(service): Sections<S>,
    Path(id): Path<SectionTeacherId>,
) -> Result<Response, ServiceError> {
    service.remove_teacher(id).map(|_| no_content())
}
