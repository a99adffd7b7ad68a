use serde::Serialize;
use tracing::{debug, info};

use super::calendar::{AcademicCalendarBlueprint, CalendarEntry, CalendarEntryId, CalendarEntryInput};
use super::catalog::CatalogImportSummary;
use super::curriculum::{
    Course, CourseId, CourseInput, CourseRequisite, CourseRequisiteId, CourseRequisiteInput,
    CourseView, Curriculum, CurriculumDetail, CurriculumDetailId, CurriculumDetailInput,
    CurriculumDetailView, CurriculumId, CurriculumInput, CurriculumTaggingView,
};
use super::school_year::{SchoolYear, SchoolYearId, SchoolYearInput, SchoolYearView};
use super::structure::*;
use crate::designations::UserId;
use crate::service::{
    ensure_date_range, ensure_named, RuleViolation, ServiceContext, ServiceResult,
};
use crate::store::{Database, Record, Store, StoreError, Table};

/// Reference data, school years with their calendars, courses, and curricula.
pub struct AcademicService<S> {
    ctx: ServiceContext<S>,
    blueprint: AcademicCalendarBlueprint,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurriculumView {
    #[serde(flatten)]
    pub curriculum: Curriculum,
    pub details: Vec<CurriculumDetailView>,
}

impl<S> AcademicService<S>
where
    S: Store + 'static,
{
    pub fn new(ctx: ServiceContext<S>) -> Self {
        Self {
            ctx,
            blueprint: AcademicCalendarBlueprint::standard(),
        }
    }

    fn list<R: Record>(&self, table: impl Fn(&Database) -> &Table<R>) -> ServiceResult<Vec<R>> {
        self.ctx.read(|db| Ok(table(db).iter().cloned().collect()))
    }

    fn fetch<R: Record>(
        &self,
        id: R::Id,
        table: impl Fn(&Database) -> &Table<R>,
    ) -> ServiceResult<R> {
        self.ctx.read(|db| Ok(table(db).require(id)?.clone()))
    }

    // ---- school years -------------------------------------------------

    pub fn list_school_years(&self) -> ServiceResult<Vec<SchoolYearView>> {
        let today = self.ctx.clock.today();
        self.ctx.read(|db| {
            Ok(db
                .school_years
                .iter()
                .map(|year| db.school_year_view(year, today))
                .collect())
        })
    }

    pub fn school_year(&self, id: SchoolYearId) -> ServiceResult<SchoolYearView> {
        let today = self.ctx.clock.today();
        self.ctx.read(|db| {
            let year = db.school_years.require(id)?;
            Ok(db.school_year_view(year, today))
        })
    }

    pub fn active_school_year(&self) -> ServiceResult<Option<SchoolYearView>> {
        let today = self.ctx.clock.today();
        self.ctx.read(|db| {
            Ok(db
                .active_school_year()
                .map(|year| db.school_year_view(year, today)))
        })
    }

    /// Creates the year and its standard calendar in one write.
    pub fn create_school_year(&self, input: SchoolYearInput) -> ServiceResult<SchoolYearView> {
        let input = input.normalized();
        let today = self.ctx.clock.today();
        let blueprint = &self.blueprint;
        let (view, events) = self.ctx.write(|db| {
            db.validate_school_year(&input, None)?;
            let year = db.school_years.insert_with(|id| SchoolYear {
                id,
                school_year_code: input.school_year_code,
                name: input.name,
                start_date: input.start_date,
                end_date: input.end_date,
                is_active: input.is_active,
            });

            let planned = blueprint.plan_for(&year);
            let events = planned.len();
            for event in planned {
                db.calendar.insert_with(|id| CalendarEntry {
                    id,
                    school_year_id: year.id,
                    name: event.name,
                    description: Some(event.description),
                    start_date: event.start_date,
                    end_date: event.end_date,
                    event: event.event,
                    order: event.order,
                });
            }

            Ok((db.school_year_view(&year, today), events))
        })?;

        info!(
            school_year = %view.school_year.school_year_code,
            events,
            "school year created with standard calendar"
        );
        Ok(view)
    }

    /// Updates the year in place. The calendar is left as it is.
    pub fn update_school_year(
        &self,
        id: SchoolYearId,
        input: SchoolYearInput,
    ) -> ServiceResult<SchoolYearView> {
        let input = input.normalized();
        let today = self.ctx.clock.today();
        self.ctx.write(|db| {
            db.school_years.require(id)?;
            db.validate_school_year(&input, Some(id))?;
            let year = db.school_years.require_mut(id)?;
            year.school_year_code = input.school_year_code;
            year.name = input.name;
            year.start_date = input.start_date;
            year.end_date = input.end_date;
            year.is_active = input.is_active;
            let year = year.clone();
            Ok(db.school_year_view(&year, today))
        })
    }

    /// Removes the year and its calendar; refused while anything else refers to it.
    pub fn delete_school_year(&self, id: SchoolYearId) -> ServiceResult<()> {
        let removed = self.ctx.write(|db| {
            db.school_years.require(id)?;
            let referenced = db.sections.any(|section| section.school_year_id == Some(id))
                || db
                    .university_admissions
                    .any(|admission| admission.school_year_id == id)
                || db
                    .program_criteria
                    .any(|criteria| criteria.school_year_id == id)
                || db
                    .program_requirements
                    .any(|requirement| requirement.school_year_id == id);
            if referenced {
                return Err(StoreError::Conflict(format!("school year {id} is still referenced")).into());
            }

            let removed = db.calendar.remove_where(|entry| entry.school_year_id == id);
            db.school_years.remove(id)?;
            Ok(removed)
        })?;

        info!(school_year = %id, calendar_events = removed, "school year deleted");
        Ok(())
    }

    pub fn calendar(&self, id: SchoolYearId) -> ServiceResult<Vec<CalendarEntry>> {
        self.ctx.read(|db| {
            db.school_years.require(id)?;
            let mut entries: Vec<_> = db
                .calendar
                .filter(|entry| entry.school_year_id == id)
                .cloned()
                .collect();
            entries.sort_by_key(|entry| (entry.order, entry.start_date));
            Ok(entries)
        })
    }

    pub fn add_calendar_entry(
        &self,
        school_year: SchoolYearId,
        input: CalendarEntryInput,
    ) -> ServiceResult<CalendarEntry> {
        ensure_named("name", &input.name)?;
        ensure_date_range(input.start_date, input.end_date)?;
        self.ctx.write(|db| {
            db.school_years.require(school_year)?;
            let order = input.order.unwrap_or_else(|| {
                db.calendar
                    .filter(|entry| entry.school_year_id == school_year)
                    .map(|entry| entry.order)
                    .max()
                    .unwrap_or(0)
                    + 1
            });
            Ok(db.calendar.insert_with(|id| CalendarEntry {
                id,
                school_year_id: school_year,
                name: input.name,
                description: input.description,
                start_date: input.start_date,
                end_date: input.end_date,
                event: input.event,
                order,
            }))
        })
    }

    pub fn update_calendar_entry(
        &self,
        id: CalendarEntryId,
        input: CalendarEntryInput,
    ) -> ServiceResult<CalendarEntry> {
        ensure_named("name", &input.name)?;
        ensure_date_range(input.start_date, input.end_date)?;
        self.ctx.write(|db| {
            let entry = db.calendar.require_mut(id)?;
            entry.name = input.name;
            entry.description = input.description;
            entry.start_date = input.start_date;
            entry.end_date = input.end_date;
            entry.event = input.event;
            if let Some(order) = input.order {
                entry.order = order;
            }
            Ok(entry.clone())
        })
    }

    pub fn delete_calendar_entry(&self, id: CalendarEntryId) -> ServiceResult<()> {
        self.ctx.write(|db| {
            db.calendar.remove(id)?;
            Ok(())
        })
    }

    // ---- structure ----------------------------------------------------

    pub fn create_campus(&self, input: CampusInput) -> ServiceResult<Campus> {
        ensure_named("name", &input.name)?;
        self.ctx.write(|db| {
            Ok(db.campuses.insert_with(|id| Campus {
                id,
                name: input.name,
                short_name: input.short_name,
                address: input.address,
            }))
        })
    }

    pub fn campuses(&self) -> ServiceResult<Vec<Campus>> {
        self.list(|db| &db.campuses)
    }

    pub fn campus(&self, id: CampusId) -> ServiceResult<Campus> {
        self.fetch(id, |db| &db.campuses)
    }

    pub fn create_building(&self, input: BuildingInput) -> ServiceResult<Building> {
        ensure_named("name", &input.name)?;
        self.ctx.write(|db| {
            db.campuses.require(input.campus_id)?;
            Ok(db.buildings.insert_with(|id| Building {
                id,
                campus_id: input.campus_id,
                name: input.name,
                short_name: input.short_name,
                latitude: input.latitude,
                longitude: input.longitude,
            }))
        })
    }

    pub fn buildings(&self) -> ServiceResult<Vec<Building>> {
        self.list(|db| &db.buildings)
    }

    pub fn building(&self, id: BuildingId) -> ServiceResult<Building> {
        self.fetch(id, |db| &db.buildings)
    }

    pub fn create_room(&self, input: RoomInput) -> ServiceResult<Room> {
        ensure_named("room_code", &input.room_code)?;
        self.ctx.write(|db| {
            db.buildings.require(input.building_id)?;
            db.rooms.ensure_unique("room code already exists in building", |room| {
                room.building_id == input.building_id && room.room_code == input.room_code
            })?;
            Ok(db.rooms.insert_with(|id| Room {
                id,
                building_id: input.building_id,
                name: input.name,
                short_name: input.short_name,
                floor: input.floor,
                room_code: input.room_code,
                is_lab: input.is_lab,
                room_capacity: input.room_capacity,
            }))
        })
    }

    pub fn rooms(&self) -> ServiceResult<Vec<Room>> {
        self.list(|db| &db.rooms)
    }

    pub fn room(&self, id: RoomId) -> ServiceResult<Room> {
        self.fetch(id, |db| &db.rooms)
    }

    pub fn create_college(&self, input: CollegeInput) -> ServiceResult<College> {
        ensure_named("college_name", &input.college_name)?;
        self.ctx.write(|db| {
            db.campuses.require(input.campus_id)?;
            Ok(db.colleges.insert_with(|id| College {
                id,
                campus_id: input.campus_id,
                college_name: input.college_name,
                college_shortname: input.college_shortname,
            }))
        })
    }

    pub fn colleges(&self) -> ServiceResult<Vec<College>> {
        self.list(|db| &db.colleges)
    }

    pub fn college(&self, id: CollegeId) -> ServiceResult<College> {
        self.fetch(id, |db| &db.colleges)
    }

    pub fn create_program_type(&self, input: ProgramTypeInput) -> ServiceResult<ProgramType> {
        ensure_named("name", &input.name)?;
        self.ctx.write(|db| {
            Ok(db.program_types.insert_with(|id| ProgramType {
                id,
                name: input.name,
                description: input.description,
            }))
        })
    }

    pub fn program_types(&self) -> ServiceResult<Vec<ProgramType>> {
        self.list(|db| &db.program_types)
    }

    pub fn program_type(&self, id: ProgramTypeId) -> ServiceResult<ProgramType> {
        self.fetch(id, |db| &db.program_types)
    }

    pub fn create_program(&self, input: AcademicProgramInput) -> ServiceResult<AcademicProgram> {
        ensure_named("program_name", &input.program_name)?;
        self.ctx.write(|db| {
            db.colleges.require(input.college_id)?;
            db.program_types.require(input.program_type_id)?;
            Ok(db.programs.insert_with(|id| AcademicProgram {
                id,
                college_id: input.college_id,
                program_type_id: input.program_type_id,
                program_name: input.program_name,
                short_name: input.short_name,
                year_first_implemented: input.year_first_implemented,
            }))
        })
    }

    pub fn programs(&self) -> ServiceResult<Vec<AcademicProgram>> {
        self.list(|db| &db.programs)
    }

    pub fn program(&self, id: AcademicProgramId) -> ServiceResult<AcademicProgram> {
        self.fetch(id, |db| &db.programs)
    }

    pub fn create_academic_term(&self, input: AcademicTermInput) -> ServiceResult<AcademicTerm> {
        ensure_named("name", &input.name)?;
        if input.number_of_terms == 0 {
            return Err(RuleViolation::invalid("number_of_terms", "must be at least 1").into());
        }
        self.ctx.write(|db| {
            Ok(db.academic_terms.insert_with(|id| AcademicTerm {
                id,
                name: input.name,
                suffix: input.suffix,
                description: input.description,
                number_of_terms: input.number_of_terms,
            }))
        })
    }

    pub fn academic_terms(&self) -> ServiceResult<Vec<AcademicTerm>> {
        self.list(|db| &db.academic_terms)
    }

    pub fn academic_term(&self, id: AcademicTermId) -> ServiceResult<AcademicTerm> {
        self.fetch(id, |db| &db.academic_terms)
    }

    pub fn create_requirement(&self, input: RequirementInput) -> ServiceResult<Requirement> {
        ensure_named("requirement_name", &input.requirement_name)?;
        self.ctx.write(|db| {
            Ok(db.requirements.insert_with(|id| Requirement {
                id,
                requirement_name: input.requirement_name,
                description: input.description,
                requirement_type: input.requirement_type,
                is_mandatory: input.is_mandatory,
                is_active: input.is_active,
            }))
        })
    }

    pub fn requirements(&self) -> ServiceResult<Vec<Requirement>> {
        self.list(|db| &db.requirements)
    }

    pub fn requirement(&self, id: RequirementId) -> ServiceResult<Requirement> {
        self.fetch(id, |db| &db.requirements)
    }

    pub fn attach_program_requirement(
        &self,
        input: ProgramRequirementInput,
    ) -> ServiceResult<ProgramRequirement> {
        self.ctx.write(|db| {
            db.programs.require(input.academic_program_id)?;
            db.requirements.require(input.requirement_id)?;
            db.school_years.require(input.school_year_id)?;
            db.program_requirements.ensure_unique(
                "requirement already attached to program for this school year",
                |row| {
                    row.academic_program_id == input.academic_program_id
                        && row.requirement_id == input.requirement_id
                        && row.school_year_id == input.school_year_id
                },
            )?;
            Ok(db.program_requirements.insert_with(|id| ProgramRequirement {
                id,
                academic_program_id: input.academic_program_id,
                requirement_id: input.requirement_id,
                school_year_id: input.school_year_id,
                is_mandatory: input.is_mandatory,
                is_active: input.is_active,
            }))
        })
    }

    pub fn program_requirements(
        &self,
        program: AcademicProgramId,
    ) -> ServiceResult<Vec<ProgramRequirement>> {
        self.ctx.read(|db| {
            db.programs.require(program)?;
            Ok(db
                .program_requirements
                .filter(|row| row.academic_program_id == program)
                .cloned()
                .collect())
        })
    }

    pub fn create_testing_center(&self, input: TestingCenterInput) -> ServiceResult<TestingCenter> {
        ensure_named("code", &input.code)?;
        self.ctx.write(|db| {
            db.rooms.require(input.room_id)?;
            Ok(db.testing_centers.insert_with(|id| TestingCenter {
                id,
                room_id: input.room_id,
                code: input.code,
            }))
        })
    }

    pub fn testing_centers(&self) -> ServiceResult<Vec<TestingCenter>> {
        self.list(|db| &db.testing_centers)
    }

    pub fn testing_center(&self, id: TestingCenterId) -> ServiceResult<TestingCenter> {
        self.fetch(id, |db| &db.testing_centers)
    }

    // ---- courses ------------------------------------------------------

    pub fn create_course(&self, input: CourseInput) -> ServiceResult<CourseView> {
        validate_course(&input)?;
        self.ctx.write(|db| {
            let course = insert_course(db, input)?;
            Ok(db.course_view(&course))
        })
    }

    pub fn course(&self, id: CourseId) -> ServiceResult<CourseView> {
        self.ctx.read(|db| {
            let course = db.courses.require(id)?;
            Ok(db.course_view(course))
        })
    }

    pub fn courses(&self) -> ServiceResult<Vec<CourseView>> {
        self.ctx
            .read(|db| Ok(db.courses.iter().map(|course| db.course_view(course)).collect()))
    }

    /// Loads catalog rows, skipping codes that already exist. All-or-nothing.
    pub fn import_courses(&self, inputs: Vec<CourseInput>) -> ServiceResult<CatalogImportSummary> {
        for input in &inputs {
            validate_course(input)?;
        }

        let summary = self.ctx.write(|db| {
            let mut summary = CatalogImportSummary::default();
            for input in inputs {
                if db
                    .courses
                    .any(|course| course.course_code == input.course_code)
                {
                    summary.skipped.push(input.course_code);
                    continue;
                }
                let course = insert_course(db, input)?;
                summary.created.push(course.course_code);
            }
            Ok(summary)
        })?;

        info!(
            created = summary.created.len(),
            skipped = summary.skipped.len(),
            "course catalog imported"
        );
        Ok(summary)
    }

    pub fn add_requisite(
        &self,
        course: CourseId,
        input: CourseRequisiteInput,
    ) -> ServiceResult<CourseView> {
        if course == input.requisite_course_id {
            return Err(RuleViolation::SelfRequisite.into());
        }
        self.ctx.write(|db| {
            db.courses.require(course)?;
            db.courses.require(input.requisite_course_id)?;
            db.course_requisites.ensure_unique("course requisite already exists", |row| {
                row.course_id == course
                    && row.requisite_course_id == input.requisite_course_id
                    && row.requisite_type == input.requisite_type
            })?;
            db.course_requisites.insert_with(|id| CourseRequisite {
                id,
                course_id: course,
                requisite_course_id: input.requisite_course_id,
                requisite_type: input.requisite_type,
            });
            let course = db.courses.require(course)?.clone();
            Ok(db.course_view(&course))
        })
    }

    pub fn remove_requisite(&self, id: CourseRequisiteId) -> ServiceResult<()> {
        self.ctx.write(|db| {
            db.course_requisites.remove(id)?;
            Ok(())
        })
    }

    // ---- curricula ----------------------------------------------------

    pub fn create_curriculum(&self, input: CurriculumInput) -> ServiceResult<CurriculumView> {
        ensure_named("curriculum_code", &input.curriculum_code)?;
        ensure_named("curriculum_name", &input.curriculum_name)?;
        self.ctx.write(|db| {
            db.programs.require(input.academic_program_id)?;
            db.academic_terms.require(input.academic_term_id)?;
            db.curriculums.ensure_unique("curriculum code already exists", |row| {
                row.curriculum_code == input.curriculum_code
            })?;
            let curriculum = db.curriculums.insert_with(|id| Curriculum {
                id,
                academic_program_id: input.academic_program_id,
                academic_term_id: input.academic_term_id,
                curriculum_code: input.curriculum_code,
                curriculum_name: input.curriculum_name,
                description: input.description,
                effective_year: input.effective_year,
                total_units: input.total_units,
                total_hours: input.total_hours,
                status: input.status,
                approved_date: input.approved_date,
                approved_by: input.approved_by,
            });
            Ok(CurriculumView {
                curriculum,
                details: Vec::new(),
            })
        })
    }

    pub fn curriculum(&self, id: CurriculumId) -> ServiceResult<CurriculumView> {
        self.ctx.read(|db| {
            let curriculum = db.curriculums.require(id)?.clone();
            let mut details: Vec<_> = db
                .curriculum_details
                .filter(|detail| detail.curriculum_id == id)
                .map(|detail| db.curriculum_detail_view(detail))
                .collect();
            details.sort_by_key(|view| (view.detail.year_order, view.detail.term_order));
            Ok(CurriculumView {
                curriculum,
                details,
            })
        })
    }

    pub fn curriculums(&self) -> ServiceResult<Vec<Curriculum>> {
        self.list(|db| &db.curriculums)
    }

    pub fn add_curriculum_detail(
        &self,
        curriculum: CurriculumId,
        input: CurriculumDetailInput,
    ) -> ServiceResult<CurriculumDetailView> {
        if input.year_order == 0 || input.term_order == 0 {
            return Err(RuleViolation::invalid("year_order/term_order", "must start at 1").into());
        }
        self.ctx.write(|db| {
            let number_of_terms = {
                let curriculum = db.curriculums.require(curriculum)?;
                db.academic_terms
                    .require(curriculum.academic_term_id)?
                    .number_of_terms
            };
            if input.term_order > u32::from(number_of_terms) {
                return Err(RuleViolation::invalid(
                    "term_order",
                    format!("curriculum has only {number_of_terms} terms per year"),
                )
                .into());
            }
            db.courses.require(input.course_id)?;
            db.curriculum_details
                .ensure_unique("course already part of curriculum", |row| {
                    row.curriculum_id == curriculum && row.course_id == input.course_id
                })?;
            let detail = db.curriculum_details.insert_with(|id| CurriculumDetail {
                id,
                curriculum_id: curriculum,
                course_id: input.course_id,
                year_order: input.year_order,
                term_order: input.term_order,
                term_alias: input.term_alias,
                is_include_gwa: input.is_include_gwa,
            });
            Ok(db.curriculum_detail_view(&detail))
        })
    }

    pub fn remove_curriculum_detail(&self, id: CurriculumDetailId) -> ServiceResult<()> {
        self.ctx.write(|db| {
            if db.sections.any(|section| section.curriculum_detail_id == id) {
                return Err(
                    StoreError::Conflict(format!("curriculum detail {id} has sections")).into(),
                );
            }
            db.curriculum_details.remove(id)?;
            Ok(())
        })
    }

    pub fn curriculum_taggings(&self, user: UserId) -> ServiceResult<Vec<CurriculumTaggingView>> {
        debug!(user = %user, "listing curriculum taggings");
        self.ctx.read(|db| {
            db.users.require(user)?;
            Ok(db
                .curriculum_taggings
                .filter(|tagging| tagging.user_id == user)
                .map(|tagging| db.curriculum_tagging_view(tagging))
                .collect())
        })
    }
}

fn validate_course(input: &CourseInput) -> Result<(), RuleViolation> {
    ensure_named("course_code", &input.course_code)?;
    ensure_named("course_title", &input.course_title)?;
    for (field, units) in [
        ("lecture_units", input.lecture_units),
        ("laboratory_units", input.laboratory_units),
        ("credit_units", input.credit_units),
    ] {
        if !units.is_finite() || units < 0.0 {
            return Err(RuleViolation::invalid(field, "must be a non-negative number"));
        }
    }
    Ok(())
}

fn insert_course(db: &mut Database, input: CourseInput) -> Result<Course, StoreError> {
    db.courses.ensure_unique("course code already exists", |row| {
        row.course_code == input.course_code
    })?;
    Ok(db.courses.insert_with(|id| Course {
        id,
        course_code: input.course_code,
        course_title: input.course_title,
        course_description: input.course_description,
        with_laboratory: input.with_laboratory,
        is_specialize: input.is_specialize,
        lecture_units: input.lecture_units,
        laboratory_units: input.laboratory_units,
        credit_units: input.credit_units,
    }))
}
