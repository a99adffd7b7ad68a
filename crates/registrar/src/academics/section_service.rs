use serde::Deserialize;
use tracing::info;

use super::curriculum::{CurriculumDetailId, CurriculumId};
use super::school_year::SchoolYearId;
use super::sections::{
    GenerateSectionsInput, ScheduleAssignment, ScheduleAssignmentId, ScheduleAssignmentInput,
    Section, SectionId, SectionSuffix, SectionTeacher, SectionTeacherId, SectionTeacherInput,
    SectionView, DEFAULT_MAX_STUDENTS, DEFAULT_MIN_STUDENTS,
};
use crate::service::{RuleViolation, ServiceContext, ServiceResult};
use crate::store::{Store, StoreError};

/// Section generation, lookup, and scheduling.
pub struct SectionService<S> {
    ctx: ServiceContext<S>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionFilter {
    #[serde(default)]
    pub curriculum_id: Option<CurriculumId>,
    #[serde(default)]
    pub school_year_id: Option<SchoolYearId>,
    #[serde(default)]
    pub section_code: Option<String>,
}

impl<S> SectionService<S>
where
    S: Store + 'static,
{
    pub fn new(ctx: ServiceContext<S>) -> Self {
        Self { ctx }
    }

    /// Creates `number_of_section` new section names for the curriculum's year and term,
    /// one row per course offered in that term.
    pub fn generate(&self, input: GenerateSectionsInput) -> ServiceResult<Vec<SectionView>> {
        if input.number_of_section == 0 {
            return Err(RuleViolation::invalid("number_of_section", "must be at least 1").into());
        }

        let views = self.ctx.write(|db| {
            let curriculum_code = db
                .curriculums
                .require(input.curriculum_id)?
                .curriculum_code
                .clone();
            let school_year = match input.school_year_id {
                Some(id) => Some(db.school_years.require(id)?.id),
                None => db.active_school_year().map(|year| year.id),
            };

            let details: Vec<CurriculumDetailId> = db
                .curriculum_details
                .filter(|detail| {
                    detail.curriculum_id == input.curriculum_id
                        && detail.year_order == input.year_order
                        && detail.term_order == input.term_order
                })
                .map(|detail| detail.id)
                .collect();
            if details.is_empty() {
                return Err(RuleViolation::invalid(
                    "curriculum",
                    format!(
                        "no courses for year {} term {}",
                        input.year_order, input.term_order
                    ),
                )
                .into());
            }

            let mut suffix = db
                .last_section_suffix(input.curriculum_id, input.year_order, input.term_order)
                .map(SectionSuffix::next)
                .unwrap_or(SectionSuffix::FIRST);
            let mut reserved_codes = Vec::new();
            let mut created = Vec::new();

            for _ in 0..input.number_of_section {
                let name = suffix.render(&curriculum_code, input.year_order);
                let code = db.unique_section_code(&reserved_codes);
                reserved_codes.push(code.clone());

                for detail in &details {
                    if db.sections.any(|section| {
                        section.curriculum_detail_id == *detail && section.section_name == name
                    }) {
                        continue;
                    }
                    let section_ref = db.unique_section_ref();
                    created.push(db.sections.insert_with(|id| Section {
                        id,
                        curriculum_detail_id: *detail,
                        school_year_id: school_year,
                        section_ref,
                        section_code: code.clone(),
                        section_name: name.clone(),
                        min_students: DEFAULT_MIN_STUDENTS,
                        max_students: DEFAULT_MAX_STUDENTS,
                        is_posted: input.auto_post,
                    }));
                }

                suffix = suffix.next();
            }

            Ok(created
                .iter()
                .map(|section| db.section_view(section))
                .collect::<Vec<_>>())
        })?;

        info!(
            curriculum = %input.curriculum_id,
            year_order = input.year_order,
            term_order = input.term_order,
            rows = views.len(),
            "sections generated"
        );
        Ok(views)
    }

    pub fn section(&self, id: SectionId) -> ServiceResult<SectionView> {
        self.ctx.read(|db| {
            let section = db.sections.require(id)?;
            Ok(db.section_view(section))
        })
    }

    pub fn sections(&self, filter: SectionFilter) -> ServiceResult<Vec<SectionView>> {
        self.ctx.read(|db| {
            Ok(db
                .sections
                .filter(|section| {
                    filter
                        .school_year_id
                        .map_or(true, |year| section.school_year_id == Some(year))
                        && filter
                            .section_code
                            .as_deref()
                            .map_or(true, |code| section.section_code == code)
                        && filter.curriculum_id.map_or(true, |curriculum| {
                            db.curriculum_details
                                .get(section.curriculum_detail_id)
                                .is_some_and(|detail| detail.curriculum_id == curriculum)
                        })
                })
                .map(|section| db.section_view(section))
                .collect())
        })
    }

    /// Removes every row sharing `code`, with their schedules, teachers, and grade books.
    pub fn delete_by_code(&self, code: &str) -> ServiceResult<usize> {
        let removed = self.ctx.write(|db| {
            let ids: Vec<SectionId> = db
                .sections
                .filter(|section| section.section_code == code)
                .map(|section| section.id)
                .collect();
            if ids.is_empty() {
                return Err(StoreError::NotFound {
                    entity: "section code",
                    id: code.to_string(),
                }
                .into());
            }
            if db
                .enrollments
                .any(|enrollment| ids.contains(&enrollment.section_id))
            {
                return Err(
                    StoreError::Conflict(format!("section {code} has enrollments")).into(),
                );
            }

            let gradebooks: Vec<_> = db
                .gradebooks
                .filter(|book| book.section_id.is_some_and(|section| ids.contains(&section)))
                .map(|book| book.id)
                .collect();
            for gradebook in gradebooks {
                db.remove_gradebook(gradebook);
            }
            db.schedule_assignments
                .remove_where(|slot| ids.contains(&slot.section_id));
            db.section_teachers
                .remove_where(|teacher| ids.contains(&teacher.section_id));
            Ok(db
                .sections
                .remove_where(|section| ids.contains(&section.id)))
        })?;

        info!(section_code = code, removed, "sections deleted");
        Ok(removed)
    }

    pub fn set_posted(&self, id: SectionId, is_posted: bool) -> ServiceResult<SectionView> {
        self.ctx.write(|db| {
            let section = db.sections.require_mut(id)?;
            section.is_posted = is_posted;
            let section = section.clone();
            Ok(db.section_view(&section))
        })
    }

    pub fn add_schedule(
        &self,
        section: SectionId,
        input: ScheduleAssignmentInput,
    ) -> ServiceResult<ScheduleAssignment> {
        self.ctx.write(|db| {
            db.sections.require(section)?;
            db.rooms.require(input.room_id)?;
            db.ensure_room_free(
                input.room_id,
                input.day_schedule,
                input.start_time,
                input.end_time,
            )?;
            Ok(db.schedule_assignments.insert_with(|id| ScheduleAssignment {
                id,
                section_id: section,
                room_id: input.room_id,
                day_schedule: input.day_schedule,
                start_time: input.start_time,
                end_time: input.end_time,
            }))
        })
    }

    pub fn remove_schedule(&self, id: ScheduleAssignmentId) -> ServiceResult<()> {
        self.ctx.write(|db| {
            db.schedule_assignments.remove(id)?;
            Ok(())
        })
    }

    pub fn assign_teacher(
        &self,
        section: SectionId,
        input: SectionTeacherInput,
    ) -> ServiceResult<SectionTeacher> {
        self.ctx.write(|db| {
            db.sections.require(section)?;
            db.users.require(input.user_id)?;
            db.section_teachers
                .ensure_unique("teacher already assigned to section", |row| {
                    row.section_id == section && row.user_id == input.user_id
                })?;
            Ok(db.section_teachers.insert_with(|id| SectionTeacher {
                id,
                section_id: section,
                user_id: input.user_id,
            }))
        })
    }

    pub fn remove_teacher(&self, id: SectionTeacherId) -> ServiceResult<()> {
        self.ctx.write(|db| {
            db.section_teachers.remove(id)?;
            Ok(())
        })
    }
}
