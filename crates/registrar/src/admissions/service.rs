use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::evaluation::{Evaluation, ScoringOutcome};
use super::program::{
    next_pool_no, AdmissionApplication, AdmissionApplicationId, AdmissionApplicationInput,
    AdmissionApplicationView, AdmissionLog, AdmissionSchedule, AdmissionScheduleInput,
    AdmissionScore, AdmissionStatus, DecisionInput, ProgramCriteria, ProgramCriteriaInput,
    ScoreInput,
};
use crate::academics::{AcademicProgramId, SchoolYearId};
use crate::notifications::{Notifiable, NotifiableKind, NotificationDraft, ADMISSION_ACCEPTED};
use crate::service::{
    ensure_date_range, ensure_named, RuleViolation, ServiceContext, ServiceResult,
};
use crate::store::{Database, Store};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CriteriaFilter {
    pub academic_program_id: Option<AcademicProgramId>,
    pub school_year_id: Option<SchoolYearId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoringResult {
    pub scores: Vec<AdmissionScore>,
    pub evaluation: Evaluation,
}

/// Program-level admissions: schedules, criteria, applications, decisions, and scoring.
pub struct AdmissionService<S> {
    ctx: ServiceContext<S>,
}

impl<S> AdmissionService<S>
where
    S: Store + 'static,
{
    pub fn new(ctx: ServiceContext<S>) -> Self {
        Self { ctx }
    }

    pub fn create_schedule(&self, input: AdmissionScheduleInput) -> ServiceResult<AdmissionSchedule> {
        ensure_date_range(input.start_date, input.end_date)?;
        self.ctx.write(|db| {
            db.programs.require(input.academic_program_id)?;
            let admission = db
                .university_admissions
                .require(input.university_admission_id)?;
            if !admission.window_contains(input.start_date) {
                return Err(RuleViolation::OutsideAdmissionWindow {
                    what: "admission schedule start",
                }
                .into());
            }
            if input.end_date > admission.close_date {
                return Err(RuleViolation::OutsideAdmissionWindow {
                    what: "admission schedule end",
                }
                .into());
            }
            Ok(db.admission_schedules.insert_with(|id| AdmissionSchedule {
                id,
                university_admission_id: input.university_admission_id,
                academic_program_id: input.academic_program_id,
                start_date: input.start_date,
                end_date: input.end_date,
            }))
        })
    }

    pub fn schedules(&self) -> ServiceResult<Vec<AdmissionSchedule>> {
        self.ctx
            .read(|db| Ok(db.admission_schedules.iter().cloned().collect()))
    }

    pub fn create_criteria(&self, input: ProgramCriteriaInput) -> ServiceResult<ProgramCriteria> {
        ensure_named("title", &input.title)?;
        validate_weights(input.max_score, input.min_score, input.weight)?;
        self.ctx.write(|db| {
            db.programs.require(input.academic_program_id)?;
            db.school_years.require(input.school_year_id)?;
            db.program_criteria.ensure_unique(
                "criteria title already used for program and school year",
                |row| {
                    row.academic_program_id == input.academic_program_id
                        && row.school_year_id == input.school_year_id
                        && row.title == input.title
                },
            )?;
            Ok(db.program_criteria.insert_with(|id| ProgramCriteria {
                id,
                academic_program_id: input.academic_program_id,
                school_year_id: input.school_year_id,
                title: input.title,
                description: input.description,
                max_score: input.max_score,
                min_score: input.min_score,
                weight: input.weight,
                is_active: input.is_active,
            }))
        })
    }

    pub fn criteria(&self, filter: CriteriaFilter) -> ServiceResult<Vec<ProgramCriteria>> {
        self.ctx.read(|db| {
            Ok(db
                .program_criteria
                .filter(|row| {
                    filter
                        .academic_program_id
                        .map_or(true, |program| row.academic_program_id == program)
                        && filter
                            .school_year_id
                            .map_or(true, |year| row.school_year_id == year)
                })
                .cloned()
                .collect())
        })
    }

    /// Stores the application with the next pool number of its year and a `submitted` log.
    pub fn submit_application(
        &self,
        input: AdmissionApplicationInput,
    ) -> ServiceResult<AdmissionApplicationView> {
        ensure_named("first_name", &input.first_name)?;
        ensure_named("last_name", &input.last_name)?;
        ensure_named("email", &input.email)?;
        let now = self.ctx.clock.now();
        let today = now.date();
        let year = input.year.unwrap_or_else(|| today.year());

        let view = self.ctx.write(|db| {
            db.users.require(input.user_id)?;
            db.admission_schedules.require(input.admission_schedule_id)?;
            let pool_no = next_pool_no(
                db.admission_applications
                    .filter(|row| row.year == year)
                    .map(|row| row.pool_no),
            );
            let application = db.admission_applications.insert_with(|id| AdmissionApplication {
                id,
                user_id: input.user_id,
                admission_schedule_id: input.admission_schedule_id,
                year,
                pool_no,
                first_name: input.first_name,
                last_name: input.last_name,
                middle_name: input.middle_name,
                email: input.email,
                phone: input.phone,
                address: input.address,
                created_at: now,
            });
            db.admission_logs.insert_with(|id| AdmissionLog {
                id,
                admission_application_id: application.id,
                user_id: application.user_id,
                status: AdmissionStatus::Submitted,
                note: None,
                created_at: now,
            });
            Ok(db.admission_application_view(&application, today))
        })?;

        info!(
            application = %view.application.id,
            year = view.application.year,
            pool_no = view.application.pool_no,
            "admission application submitted"
        );
        Ok(view)
    }

    pub fn application(&self, id: AdmissionApplicationId) -> ServiceResult<AdmissionApplicationView> {
        let today = self.ctx.clock.today();
        self.ctx.read(|db| {
            let application = db.admission_applications.require(id)?;
            Ok(db.admission_application_view(application, today))
        })
    }

    pub fn applications(&self) -> ServiceResult<Vec<AdmissionApplicationView>> {
        let today = self.ctx.clock.today();
        self.ctx.read(|db| {
            Ok(db
                .admission_applications
                .iter()
                .map(|application| db.admission_application_view(application, today))
                .collect())
        })
    }

    pub fn logs(&self, id: AdmissionApplicationId) -> ServiceResult<Vec<AdmissionLog>> {
        self.ctx.read(|db| {
            db.admission_applications.require(id)?;
            Ok(db
                .admission_logs
                .filter(|log| log.admission_application_id == id)
                .cloned()
                .collect())
        })
    }

    /// Records a manual decision: approve for evaluation, reject, or cancel.
    pub fn record_decision(
        &self,
        id: AdmissionApplicationId,
        input: DecisionInput,
    ) -> ServiceResult<AdmissionLog> {
        if input.status.is_system_managed() {
            return Err(RuleViolation::SystemManagedStatus {
                status: input.status.as_str(),
            }
            .into());
        }
        let now = self.ctx.clock.now();
        let log = self.ctx.write(|db| {
            db.admission_applications.require(id)?;
            db.users.require(input.user_id)?;
            let latest = db.latest_admission_status(id);
            if latest.is_closed() {
                return Err(RuleViolation::ApplicationClosed {
                    status: latest.as_str(),
                }
                .into());
            }
            db.admission_logs
                .ensure_unique("decision already recorded by this user", |log| {
                    log.admission_application_id == id
                        && log.user_id == input.user_id
                        && log.status == input.status
                })?;
            Ok(db.admission_logs.insert_with(|log_id| AdmissionLog {
                id: log_id,
                admission_application_id: id,
                user_id: input.user_id,
                status: input.status,
                note: input.note,
                created_at: now,
            }))
        })?;

        info!(application = %id, status = log.status.as_str(), "admission decision recorded");
        Ok(log)
    }

    pub fn scores(&self, id: AdmissionApplicationId) -> ServiceResult<Vec<AdmissionScore>> {
        self.ctx.read(|db| {
            db.admission_applications.require(id)?;
            Ok(db
                .admission_scores
                .filter(|score| score.admission_application_id == id)
                .cloned()
                .collect())
        })
    }

    /// Upserts a batch of evaluator scores and re-runs the acceptance hook after each row.
    pub fn upsert_scores(
        &self,
        id: AdmissionApplicationId,
        inputs: Vec<ScoreInput>,
    ) -> ServiceResult<ScoringResult> {
        let threshold = self.ctx.policy.admission_threshold;
        let now = self.ctx.clock.now();

        let (sheet, accepted, user) = self.ctx.write(|db| {
            let application = db.admission_applications.require(id)?.clone();
            let latest = db.latest_admission_status(id);
            if latest.is_closed() {
                return Err(RuleViolation::ApplicationClosed {
                    status: latest.as_str(),
                }
                .into());
            }
            let (program, school_year) = db.application_scope(&application)?;
            let mut accepted = Vec::new();

            for input in inputs {
                let criteria = db.program_criteria.require(input.criteria_id)?;
                if criteria.academic_program_id != program || criteria.school_year_id != school_year
                {
                    return Err(RuleViolation::CriteriaMismatch.into());
                }
                if !input.score.is_finite() || input.score < 0.0 || input.score > criteria.max_score
                {
                    return Err(RuleViolation::ScoreOutOfRange {
                        score: input.score,
                        max: criteria.max_score,
                    }
                    .into());
                }
                db.users.require(input.user_id)?;

                let (score, inserted) = upsert_score(db, id, input);
                match db.apply_scoring_hook(&score, inserted, threshold, now)? {
                    ScoringOutcome::Accepted(log) => accepted.push(log.id),
                    ScoringOutcome::Revoked(removed) => {
                        debug!(application = %id, removed, "acceptance revoked");
                    }
                    ScoringOutcome::Unchanged => {}
                }
            }

            accepted.retain(|log| db.admission_logs.get(*log).is_some());
            let sheet = ScoringResult {
                scores: db
                    .admission_scores
                    .filter(|score| score.admission_application_id == id)
                    .cloned()
                    .collect(),
                evaluation: db.evaluate_admission(id, threshold)?,
            };
            Ok((sheet, !accepted.is_empty(), application.user_id))
        })?;

        info!(
            application = %id,
            percent = sheet.evaluation.percent,
            passing = sheet.evaluation.is_passing,
            "admission scores saved"
        );

        if accepted {
            self.ctx.notify(NotificationDraft {
                user_id: user,
                notifiable: Notifiable {
                    kind: NotifiableKind::AdmissionApplication,
                    id: id.0,
                },
                kind: ADMISSION_ACCEPTED,
                title: "Admission accepted".to_string(),
                message: format!(
                    "Your application passed evaluation with {:.2}% and is ready for enrollment.",
                    sheet.evaluation.percent
                ),
            })?;
        }
        Ok(sheet)
    }

    pub fn evaluation(&self, id: AdmissionApplicationId) -> ServiceResult<Evaluation> {
        let threshold = self.ctx.policy.admission_threshold;
        self.ctx
            .read(|db| Ok(db.evaluate_admission(id, threshold)?))
    }
}

pub(crate) fn validate_weights(max_score: f64, min_score: f64, weight: f64) -> Result<(), RuleViolation> {
    if !max_score.is_finite() || max_score <= 0.0 {
        return Err(RuleViolation::invalid("max_score", "must be greater than zero"));
    }
    if !min_score.is_finite() || min_score < 0.0 || min_score > max_score {
        return Err(RuleViolation::invalid("min_score", "must be between 0 and max_score"));
    }
    if !weight.is_finite() || weight <= 0.0 {
        return Err(RuleViolation::invalid("weight", "must be greater than zero"));
    }
    Ok(())
}

/// Updates the row keyed by (application, criteria, evaluator) or inserts it.
fn upsert_score(
    db: &mut Database,
    application: AdmissionApplicationId,
    input: ScoreInput,
) -> (AdmissionScore, bool) {
    if let Some(existing) = db.admission_scores.find_mut(|row| {
        row.admission_application_id == application
            && row.criteria_id == input.criteria_id
            && row.user_id == input.user_id
    }) {
        existing.score = input.score;
        existing.comments = input.comments;
        existing.is_posted = input.is_posted;
        return (existing.clone(), false);
    }

    let score = db.admission_scores.insert_with(|id| AdmissionScore {
        id,
        admission_application_id: application,
        criteria_id: input.criteria_id,
        user_id: input.user_id,
        score: input.score,
        comments: input.comments,
        is_posted: input.is_posted,
    });
    (score, true)
}
