use serde::Deserialize;
use tracing::info;

use super::{
    allowed_after, Enrollment, EnrollmentAction, EnrollmentId, EnrollmentInput, EnrollmentLog,
    EnrollmentLogInput, EnrollmentView,
};
use crate::academics::SectionId;
use crate::designations::UserId;
use crate::notifications::{Notifiable, NotifiableKind, NotificationDraft, ENROLLMENT_CONFIRMED};
use crate::service::{RuleViolation, ServiceContext, ServiceResult};
use crate::store::{Database, Store, StoreError};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct EnrollmentFilter {
    pub user_id: Option<UserId>,
    pub section_id: Option<SectionId>,
}

pub struct EnrollmentService<S> {
    ctx: ServiceContext<S>,
}

impl<S> EnrollmentService<S>
where
    S: Store + 'static,
{
    pub fn new(ctx: ServiceContext<S>) -> Self {
        Self { ctx }
    }

    /// Enrolls a student and records the initial `enroll` log in the same write.
    pub fn enroll(&self, input: EnrollmentInput) -> ServiceResult<EnrollmentView> {
        let now = self.ctx.clock.now();
        let view = self.ctx.write(|db| {
            db.users.require(input.user_id)?;
            let section = db.sections.require(input.section_id)?;
            if db.available_slots(section) <= 0 {
                return Err(RuleViolation::SectionFull.into());
            }
            db.enrollments
                .ensure_unique("student already enrolled in section", |row| {
                    row.user_id == input.user_id && row.section_id == input.section_id
                })?;

            let enrollment = db.enrollments.insert_with(|id| Enrollment {
                id,
                user_id: input.user_id,
                section_id: input.section_id,
                created_at: now,
            });
            db.enrollment_logs.insert_with(|id| EnrollmentLog {
                id,
                enrollment_id: enrollment.id,
                user_id: enrollment.user_id,
                logged_by: enrollment.user_id,
                action: EnrollmentAction::Enroll,
                created_at: now,
            });
            Ok(db.enrollment_view(&enrollment))
        })?;

        info!(
            enrollment = %view.enrollment.id,
            user = %view.enrollment.user_id,
            section = %view.enrollment.section_id,
            "enrollment submitted"
        );
        Ok(view)
    }

    pub fn enrollment(&self, id: EnrollmentId) -> ServiceResult<EnrollmentView> {
        self.ctx.read(|db| {
            let enrollment = db.enrollments.require(id)?;
            Ok(db.enrollment_view(enrollment))
        })
    }

    pub fn enrollments(&self, filter: EnrollmentFilter) -> ServiceResult<Vec<EnrollmentView>> {
        self.ctx.read(|db| {
            Ok(db
                .enrollments
                .filter(|row| {
                    filter.user_id.map_or(true, |user| row.user_id == user)
                        && filter.section_id.map_or(true, |section| row.section_id == section)
                })
                .map(|row| db.enrollment_view(row))
                .collect())
        })
    }

    pub fn logs(&self, id: EnrollmentId) -> ServiceResult<Vec<EnrollmentLog>> {
        self.ctx.read(|db| {
            db.enrollments.require(id)?;
            Ok(db
                .enrollment_logs
                .filter(|log| log.enrollment_id == id)
                .cloned()
                .collect())
        })
    }

    /// Appends an approval or drop step. A registrar approval tags the student with the
    /// section's curriculum and notifies them.
    pub fn record(&self, id: EnrollmentId, input: EnrollmentLogInput) -> ServiceResult<EnrollmentView> {
        let now = self.ctx.clock.now();
        let (view, course_code) = self.ctx.write(|db| {
            let enrollment = db.enrollments.require(id)?.clone();
            db.users.require(input.logged_by)?;
            db.enrollment_logs
                .ensure_unique("enrollment action already recorded", |log| {
                    log.enrollment_id == id && log.action == input.action
                })?;

            let history: Vec<_> = db
                .enrollment_logs
                .filter(|log| log.enrollment_id == id)
                .map(|log| log.action)
                .collect();
            if !allowed_after(&history, input.action) {
                return Err(RuleViolation::InvalidEnrollmentTransition {
                    from: db.latest_enrollment_status(id).as_str(),
                    to: input.action.as_str(),
                }
                .into());
            }

            let mut course_code = None;
            if input.action == EnrollmentAction::RegistrarApproved {
                let section = db.sections.require(enrollment.section_id)?;
                if db.available_slots(section) <= 0 {
                    return Err(RuleViolation::SectionFull.into());
                }
                let (curriculum, code) = section_curriculum(db, enrollment.section_id)?;
                db.activate_curriculum_tagging(enrollment.user_id, curriculum);
                course_code = Some(code);
            }

            db.enrollment_logs.insert_with(|log_id| EnrollmentLog {
                id: log_id,
                enrollment_id: id,
                user_id: enrollment.user_id,
                logged_by: input.logged_by,
                action: input.action,
                created_at: now,
            });
            Ok((db.enrollment_view(&enrollment), course_code))
        })?;

        info!(
            enrollment = %id,
            action = input.action.as_str(),
            logged_by = %input.logged_by,
            "enrollment action recorded"
        );

        if let Some(course_code) = course_code {
            self.ctx.notify(NotificationDraft {
                user_id: view.enrollment.user_id,
                notifiable: Notifiable {
                    kind: NotifiableKind::Enrollment,
                    id: id.0,
                },
                kind: ENROLLMENT_CONFIRMED,
                title: "Enrollment confirmed".to_string(),
                message: format!("You are officially enrolled in {course_code}."),
            })?;
        }
        Ok(view)
    }
}

fn section_curriculum(
    db: &Database,
    section: SectionId,
) -> Result<(crate::academics::CurriculumId, String), StoreError> {
    let section = db.sections.require(section)?;
    let detail = db.curriculum_details.require(section.curriculum_detail_id)?;
    let course = db.courses.require(detail.course_id)?;
    Ok((detail.curriculum_id, course.course_code.clone()))
}
