use chrono::Datelike;
use serde::Deserialize;
use tracing::info;

use super::program::{next_pool_no, AdmissionStatus, DecisionInput};
use super::service::validate_weights;
use super::university::{
    ApplicationFormInput, CriteriaSubmission, UniversityAdmission, UniversityAdmissionId,
    UniversityAdmissionInput, UniversityAdmissionView, UniversityApplication,
    UniversityApplicationId, UniversityApplicationView, UniversityCriteria,
    UniversityCriteriaInput, UniversityLog, UniversitySchedule, UniversityScheduleInput,
};
use crate::designations::UserId;
use crate::service::{
    ensure_date_range, ensure_named, RuleViolation, ServiceContext, ServiceResult,
};
use crate::store::{Database, Store, StoreError};

#[derive(Debug, Clone, Deserialize)]
pub struct ExamResultInput {
    pub is_passed: bool,
    pub score: f64,
    #[serde(default)]
    pub remark: String,
}

/// University admission windows, their criteria and exam schedules, and applications.
pub struct UniversityAdmissionService<S> {
    ctx: ServiceContext<S>,
}

impl<S> UniversityAdmissionService<S>
where
    S: Store + 'static,
{
    pub fn new(ctx: ServiceContext<S>) -> Self {
        Self { ctx }
    }

    pub fn create_admission(
        &self,
        input: UniversityAdmissionInput,
    ) -> ServiceResult<UniversityAdmissionView> {
        ensure_date_range(input.open_date, input.close_date)?;
        let today = self.ctx.clock.today();
        let admission = self.ctx.write(|db| {
            validate_admission_window(db, &input, None)?;
            Ok(db.university_admissions.insert_with(|id| UniversityAdmission {
                id,
                school_year_id: input.school_year_id,
                open_date: input.open_date,
                close_date: input.close_date,
                is_open_override: input.is_open_override,
            }))
        })?;

        info!(
            admission = %admission.id,
            school_year = %admission.school_year_id,
            "university admission opened"
        );
        Ok(view(admission, today))
    }

    pub fn update_admission(
        &self,
        id: UniversityAdmissionId,
        input: UniversityAdmissionInput,
    ) -> ServiceResult<UniversityAdmissionView> {
        ensure_date_range(input.open_date, input.close_date)?;
        let today = self.ctx.clock.today();
        let admission = self.ctx.write(|db| {
            db.university_admissions.require(id)?;
            validate_admission_window(db, &input, Some(id))?;
            let admission = db.university_admissions.require_mut(id)?;
            admission.school_year_id = input.school_year_id;
            admission.open_date = input.open_date;
            admission.close_date = input.close_date;
            admission.is_open_override = input.is_open_override;
            Ok(admission.clone())
        })?;
        Ok(view(admission, today))
    }

    pub fn admission(&self, id: UniversityAdmissionId) -> ServiceResult<UniversityAdmissionView> {
        let today = self.ctx.clock.today();
        self.ctx
            .read(|db| Ok(view(db.university_admissions.require(id)?.clone(), today)))
    }

    pub fn admissions(&self) -> ServiceResult<Vec<UniversityAdmissionView>> {
        let today = self.ctx.clock.today();
        self.ctx.read(|db| {
            Ok(db
                .university_admissions
                .iter()
                .map(|admission| view(admission.clone(), today))
                .collect())
        })
    }

    pub fn add_criteria(
        &self,
        admission: UniversityAdmissionId,
        input: UniversityCriteriaInput,
    ) -> ServiceResult<UniversityCriteria> {
        ensure_named("title", &input.title)?;
        validate_weights(input.max_score, input.min_score, input.weight)?;
        self.ctx.write(|db| {
            db.university_admissions.require(admission)?;
            db.requirements.require(input.requirement_id)?;
            db.university_criteria.ensure_unique(
                "criteria already defined for admission and requirement",
                |row| {
                    row.university_admission_id == admission
                        && row.title == input.title
                        && row.requirement_id == input.requirement_id
                },
            )?;
            Ok(db.university_criteria.insert_with(|id| UniversityCriteria {
                id,
                university_admission_id: admission,
                requirement_id: input.requirement_id,
                title: input.title,
                description: input.description,
                max_score: input.max_score,
                min_score: input.min_score,
                weight: input.weight,
                is_active: input.is_active,
                file_suffix: input.file_suffix,
            }))
        })
    }

    pub fn criteria(&self, admission: UniversityAdmissionId) -> ServiceResult<Vec<UniversityCriteria>> {
        self.ctx.read(|db| {
            db.university_admissions.require(admission)?;
            Ok(db
                .university_criteria
                .filter(|row| row.university_admission_id == admission)
                .cloned()
                .collect())
        })
    }

    pub fn add_schedule(
        &self,
        admission: UniversityAdmissionId,
        input: UniversityScheduleInput,
    ) -> ServiceResult<UniversitySchedule> {
        if input.end_date < input.start_date {
            return Err(RuleViolation::invalid("end_date", "must not precede start_date").into());
        }
        self.ctx.write(|db| {
            let window = db.university_admissions.require(admission)?;
            if !window.window_contains(input.start_date.date())
                || !window.window_contains(input.end_date.date())
            {
                return Err(RuleViolation::OutsideAdmissionWindow {
                    what: "exam schedule",
                }
                .into());
            }
            db.testing_centers.require(input.testing_center_id)?;
            db.university_schedules
                .ensure_unique("exam schedule already exists", |row| {
                    row.university_admission_id == admission
                        && row.testing_center_id == input.testing_center_id
                        && row.start_date == input.start_date
                        && row.end_date == input.end_date
                })?;
            Ok(db.university_schedules.insert_with(|id| UniversitySchedule {
                id,
                university_admission_id: admission,
                testing_center_id: input.testing_center_id,
                start_date: input.start_date,
                end_date: input.end_date,
            }))
        })
    }

    pub fn schedules(&self, admission: UniversityAdmissionId) -> ServiceResult<Vec<UniversitySchedule>> {
        self.ctx.read(|db| {
            db.university_admissions.require(admission)?;
            Ok(db
                .university_schedules
                .filter(|row| row.university_admission_id == admission)
                .cloned()
                .collect())
        })
    }

    /// Creates the application, its `submitted` log, and one submission per criterion in a
    /// single write.
    pub fn submit_application_form(
        &self,
        admission: UniversityAdmissionId,
        input: ApplicationFormInput,
    ) -> ServiceResult<UniversityApplicationView> {
        let now = self.ctx.clock.now();
        let today = now.date();
        let year = input.year.unwrap_or_else(|| today.year());

        let view = self.ctx.write(|db| {
            if !db.university_admissions.require(admission)?.is_ongoing(today) {
                return Err(RuleViolation::AdmissionNotOngoing.into());
            }
            db.users.require(input.user_id)?;
            if let Some(schedule) = input.university_schedule_id {
                if db.university_schedules.require(schedule)?.university_admission_id != admission {
                    return Err(RuleViolation::invalid(
                        "university_schedule_id",
                        "schedule belongs to another admission",
                    )
                    .into());
                }
            }

            let mut files = Vec::with_capacity(input.submissions.len());
            for submission in input.submissions {
                let criteria = db.university_criteria.require(submission.university_criteria_id)?;
                if criteria.university_admission_id != admission {
                    return Err(RuleViolation::CriteriaMismatch.into());
                }
                if !criteria.is_active {
                    return Err(RuleViolation::InactiveCriteria {
                        title: criteria.title.clone(),
                    }
                    .into());
                }
                let Some(file) = submission.file else {
                    return Err(RuleViolation::MissingSubmissionFile {
                        title: criteria.title.clone(),
                    }
                    .into());
                };
                files.push((criteria.id, file));
            }

            db.university_applications
                .ensure_unique("user already applied to this admission", |row| {
                    row.university_admission_id == admission && row.user_id == input.user_id
                })?;
            let pool_no = next_pool_no(
                db.university_applications
                    .filter(|row| row.year == year)
                    .map(|row| row.pool_no),
            );
            let application = db.university_applications.insert_with(|id| UniversityApplication {
                id,
                university_admission_id: admission,
                university_schedule_id: input.university_schedule_id,
                user_id: input.user_id,
                is_passed: false,
                score: 0.0,
                remark: String::new(),
                year,
                pool_no,
                created_at: now,
            });
            db.university_logs.insert_with(|id| UniversityLog {
                id,
                university_application_id: application.id,
                user_id: application.user_id,
                status: AdmissionStatus::Submitted,
                note: None,
                created_at: now,
            });
            for (criteria, file) in files {
                db.criteria_submissions.insert_with(|id| CriteriaSubmission {
                    id,
                    university_application_id: application.id,
                    university_criteria_id: criteria,
                    file,
                });
            }
            Ok(db.university_application_view(&application))
        })?;

        info!(
            application = %view.application.id,
            temporary_id = %view.temporary_id,
            submissions = view.submissions.len(),
            "university application submitted"
        );
        Ok(view)
    }

    pub fn application(&self, id: UniversityApplicationId) -> ServiceResult<UniversityApplicationView> {
        self.ctx.read(|db| {
            let application = db.university_applications.require(id)?;
            Ok(db.university_application_view(application))
        })
    }

    pub fn applications(
        &self,
        admission: UniversityAdmissionId,
    ) -> ServiceResult<Vec<UniversityApplicationView>> {
        self.ctx.read(|db| {
            db.university_admissions.require(admission)?;
            Ok(db
                .university_applications
                .filter(|row| row.university_admission_id == admission)
                .map(|row| db.university_application_view(row))
                .collect())
        })
    }

    pub fn logs(&self, id: UniversityApplicationId) -> ServiceResult<Vec<UniversityLog>> {
        self.ctx.read(|db| {
            db.university_applications.require(id)?;
            Ok(db
                .university_logs
                .filter(|log| log.university_application_id == id)
                .cloned()
                .collect())
        })
    }

    pub fn record_decision(
        &self,
        id: UniversityApplicationId,
        input: DecisionInput,
    ) -> ServiceResult<UniversityLog> {
        if input.status.is_system_managed() {
            return Err(RuleViolation::SystemManagedStatus {
                status: input.status.as_str(),
            }
            .into());
        }
        let now = self.ctx.clock.now();
        self.ctx.write(|db| {
            db.university_applications.require(id)?;
            db.users.require(input.user_id)?;
            let latest = db
                .university_logs
                .filter(|log| log.university_application_id == id)
                .last()
                .map_or(AdmissionStatus::Submitted, |log| log.status);
            if latest.is_closed() {
                return Err(RuleViolation::ApplicationClosed {
                    status: latest.as_str(),
                }
                .into());
            }
            db.university_logs
                .ensure_unique("decision already recorded by this user", |log| {
                    log.university_application_id == id
                        && log.user_id == input.user_id
                        && log.status == input.status
                })?;
            Ok(db.university_logs.insert_with(|log_id| UniversityLog {
                id: log_id,
                university_application_id: id,
                user_id: input.user_id,
                status: input.status,
                note: input.note,
                created_at: now,
            }))
        })
    }

    /// Records the entrance exam outcome.
    pub fn record_result(
        &self,
        id: UniversityApplicationId,
        input: ExamResultInput,
    ) -> ServiceResult<UniversityApplicationView> {
        if !input.score.is_finite() || input.score < 0.0 {
            return Err(RuleViolation::invalid("score", "must be a non-negative number").into());
        }
        self.ctx.write(|db| {
            let application = db.university_applications.require_mut(id)?;
            application.is_passed = input.is_passed;
            application.score = input.score;
            application.remark = input.remark;
            let application = application.clone();
            Ok(db.university_application_view(&application))
        })
    }

    pub fn invitation(&self, user: UserId) -> ServiceResult<Option<UniversityAdmissionView>> {
        let today = self.ctx.clock.today();
        self.ctx.read(|db| {
            db.users.require(user)?;
            Ok(db
                .invitation_for(user, today)
                .map(|admission| view(admission.clone(), today)))
        })
    }
}

fn view(admission: UniversityAdmission, today: chrono::NaiveDate) -> UniversityAdmissionView {
    UniversityAdmissionView {
        is_ongoing: admission.is_ongoing(today),
        admission,
    }
}

/// One admission per school year; open and close dates inside that year.
fn validate_admission_window(
    db: &Database,
    input: &UniversityAdmissionInput,
    exclude: Option<UniversityAdmissionId>,
) -> ServiceResult<()> {
    let year = db.school_years.require(input.school_year_id)?;
    if !year.contains(input.open_date) {
        return Err(RuleViolation::OutsideSchoolYear { what: "open date" }.into());
    }
    if !year.contains(input.close_date) {
        return Err(RuleViolation::OutsideSchoolYear { what: "close date" }.into());
    }
    if db.university_admissions.any(|row| {
        row.school_year_id == input.school_year_id && Some(row.id) != exclude
    }) {
        return Err(StoreError::Conflict(format!(
            "school year {} already has a university admission",
            input.school_year_id
        ))
        .into());
    }
    Ok(())
}
