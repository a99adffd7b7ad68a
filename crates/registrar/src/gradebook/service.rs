use serde::Deserialize;
use tracing::info;

use super::sheets::{
    FinalGradeEntry, FinalGradeSheet, PeriodGradeEntry, PeriodGradeSheet, ScoreEntry, ScoreSheet,
};
use super::{
    DetailInput, FinalGrade, GradeBook, GradeBookId, GradeBookInput, GradeBookScore,
    GradeBookView, PeriodGrade, PeriodInput,
};
use crate::academics::{AcademicProgramId, SectionId};
use crate::service::{ensure_named, RuleViolation, ServiceContext, ServiceResult};
use crate::store::{Database, Store, StoreError};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct GradeBookFilter {
    pub academic_program_id: Option<AcademicProgramId>,
    pub is_template: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstantiateInput {
    pub section_id: SectionId,
    #[serde(default)]
    pub title: Option<String>,
}

pub struct GradeBookService<S> {
    ctx: ServiceContext<S>,
}

impl<S> GradeBookService<S>
where
    S: Store + 'static,
{
    pub fn new(ctx: ServiceContext<S>) -> Self {
        Self { ctx }
    }

    /// Stores the grade book with its nested periods, items, and details.
    pub fn create(&self, input: GradeBookInput) -> ServiceResult<GradeBookView> {
        ensure_named("title", &input.title)?;
        validate_tree(&input.periods)?;
        if input.is_template == input.section_id.is_some() {
            return Err(RuleViolation::invalid(
                "section_id",
                "templates have no section and section grade books need one",
            )
            .into());
        }

        let view = self.ctx.write(|db| {
            db.programs.require(input.academic_program_id)?;
            if let Some(section) = input.section_id {
                db.sections.require(section)?;
                ensure_section_free(db, section)?;
            }
            db.gradebooks.ensure_unique("grade book already exists", |row| {
                row.section_id == input.section_id
                    && row.academic_program_id == input.academic_program_id
                    && row.is_template == input.is_template
                    && row.title == input.title
            })?;

            let gradebook = db.gradebooks.insert_with(|id| GradeBook {
                id,
                section_id: input.section_id,
                academic_program_id: input.academic_program_id,
                is_template: input.is_template,
                title: input.title,
            });
            db.insert_gradebook_tree(gradebook.id, input.periods);
            Ok(db.gradebook_view(&gradebook))
        })?;

        info!(
            gradebook = %view.gradebook.id,
            template = view.gradebook.is_template,
            fully_setup = view.fully_setup,
            "grade book created"
        );
        Ok(view)
    }

    /// Copies a template tree onto `section`.
    pub fn instantiate_template(
        &self,
        template: GradeBookId,
        input: InstantiateInput,
    ) -> ServiceResult<GradeBookView> {
        self.ctx.write(|db| {
            let source = db.gradebooks.require(template)?.clone();
            if !source.is_template {
                return Err(RuleViolation::invalid("gradebook", "not a template").into());
            }
            db.sections.require(input.section_id)?;
            ensure_section_free(db, input.section_id)?;

            let tree = db.gradebook_tree(template);
            let gradebook = db.gradebooks.insert_with(|id| GradeBook {
                id,
                section_id: Some(input.section_id),
                academic_program_id: source.academic_program_id,
                is_template: false,
                title: input.title.unwrap_or(source.title),
            });
            db.insert_gradebook_tree(gradebook.id, tree);
            Ok(db.gradebook_view(&gradebook))
        })
    }

    pub fn gradebook(&self, id: GradeBookId) -> ServiceResult<GradeBookView> {
        self.ctx.read(|db| {
            let gradebook = db.gradebooks.require(id)?;
            Ok(db.gradebook_view(gradebook))
        })
    }

    pub fn gradebooks(&self, filter: GradeBookFilter) -> ServiceResult<Vec<GradeBookView>> {
        self.ctx.read(|db| {
            Ok(db
                .gradebooks
                .filter(|row| {
                    filter
                        .academic_program_id
                        .map_or(true, |program| row.academic_program_id == program)
                        && filter.is_template.map_or(true, |flag| row.is_template == flag)
                })
                .map(|row| db.gradebook_view(row))
                .collect())
        })
    }

    pub fn section_gradebook(&self, section: SectionId) -> ServiceResult<GradeBookView> {
        self.ctx.read(|db| {
            let gradebook = db.require_section_gradebook(section)?;
            Ok(db.gradebook_view(gradebook))
        })
    }

    /// Removes the grade book, its tree, and every score recorded against it.
    pub fn delete(&self, id: GradeBookId) -> ServiceResult<()> {
        let removed = self.ctx.write(|db| {
            db.gradebooks.require(id)?;
            Ok(db.remove_gradebook(id))
        })?;

        info!(gradebook = %id, scores = removed, "grade book deleted");
        Ok(())
    }

    pub fn score_sheet(&self, section: SectionId) -> ServiceResult<ScoreSheet> {
        self.ctx.read(|db| db.score_sheet(section))
    }

    /// Upserts raw scores for the roster in one write.
    pub fn sync_scores(&self, section: SectionId, entries: Vec<ScoreEntry>) -> ServiceResult<ScoreSheet> {
        let count = entries.len();
        let sheet = self.ctx.write(|db| {
            let gradebook = db.require_section_gradebook(section)?.id;
            for entry in entries {
                db.ensure_on_roster(section, entry.enrollment_id)?;
                let detail = db.item_details.require(entry.detail_id)?;
                let belongs = db
                    .gradebook_items
                    .get(detail.item_id)
                    .and_then(|item| db.grading_periods.get(item.grading_period_id))
                    .map_or(false, |period| period.gradebook_id == gradebook);
                if !belongs {
                    return Err(
                        RuleViolation::invalid("detail_id", "not part of the section grade book")
                            .into(),
                    );
                }
                if !entry.score.is_finite() || entry.score < 0.0 || entry.score > detail.max_score {
                    return Err(RuleViolation::ScoreOutOfRange {
                        score: entry.score,
                        max: detail.max_score,
                    }
                    .into());
                }

                match db.gradebook_scores.find_mut(|row| {
                    row.detail_id == entry.detail_id && row.enrollment_id == entry.enrollment_id
                }) {
                    Some(row) => row.score = entry.score,
                    None => {
                        db.gradebook_scores.insert_with(|id| GradeBookScore {
                            id,
                            detail_id: entry.detail_id,
                            enrollment_id: entry.enrollment_id,
                            score: entry.score,
                        });
                    }
                }
            }
            db.score_sheet(section)
        })?;

        info!(section = %section, entries = count, "scores synced");
        Ok(sheet)
    }

    pub fn period_grade_sheet(&self, section: SectionId) -> ServiceResult<PeriodGradeSheet> {
        self.ctx.read(|db| db.period_grade_sheet(section))
    }

    pub fn sync_period_grades(
        &self,
        section: SectionId,
        entries: Vec<PeriodGradeEntry>,
    ) -> ServiceResult<PeriodGradeSheet> {
        let count = entries.len();
        let sheet = self.ctx.write(|db| {
            let gradebook = db.require_section_gradebook(section)?.id;
            for entry in entries {
                db.ensure_on_roster(section, entry.enrollment_id)?;
                if db.grading_periods.require(entry.grading_period_id)?.gradebook_id != gradebook {
                    return Err(RuleViolation::invalid(
                        "grading_period_id",
                        "not part of the section grade book",
                    )
                    .into());
                }
                ensure_grade(entry.grade)?;

                match db.period_grades.find_mut(|row| {
                    row.grading_period_id == entry.grading_period_id
                        && row.enrollment_id == entry.enrollment_id
                }) {
                    Some(row) => {
                        row.grade = entry.grade;
                        row.is_posted = entry.is_posted;
                    }
                    None => {
                        db.period_grades.insert_with(|id| PeriodGrade {
                            id,
                            grading_period_id: entry.grading_period_id,
                            enrollment_id: entry.enrollment_id,
                            grade: entry.grade,
                            is_posted: entry.is_posted,
                        });
                    }
                }
            }
            db.period_grade_sheet(section)
        })?;

        info!(section = %section, entries = count, "period grades synced");
        Ok(sheet)
    }

    pub fn final_grade_sheet(&self, section: SectionId) -> ServiceResult<FinalGradeSheet> {
        let passing_grade = self.ctx.policy.passing_grade;
        self.ctx
            .read(|db| db.final_grade_sheet(section, passing_grade))
    }

    /// Upserts final grades; credited units default to the course units when passing.
    pub fn sync_final_grades(
        &self,
        section: SectionId,
        entries: Vec<FinalGradeEntry>,
    ) -> ServiceResult<FinalGradeSheet> {
        let passing_grade = self.ctx.policy.passing_grade;
        let count = entries.len();
        let sheet = self.ctx.write(|db| {
            db.require_section_gradebook(section)?;
            let units = db.section_credit_units(section);
            for entry in entries {
                db.ensure_on_roster(section, entry.enrollment_id)?;
                ensure_grade(entry.grade)?;
                let credited_units = entry.credited_units.unwrap_or(if entry.grade >= passing_grade {
                    units
                } else {
                    0.0
                });
                if !credited_units.is_finite() || credited_units < 0.0 {
                    return Err(RuleViolation::invalid(
                        "credited_units",
                        "must be a non-negative number",
                    )
                    .into());
                }

                match db
                    .final_grades
                    .find_mut(|row| row.enrollment_id == entry.enrollment_id)
                {
                    Some(row) => {
                        row.grade = entry.grade;
                        row.credited_units = credited_units;
                        row.is_posted = entry.is_posted;
                    }
                    None => {
                        db.final_grades.insert_with(|id| FinalGrade {
                            id,
                            enrollment_id: entry.enrollment_id,
                            grade: entry.grade,
                            credited_units,
                            is_posted: entry.is_posted,
                        });
                    }
                }
            }
            db.final_grade_sheet(section, passing_grade)
        })?;

        info!(section = %section, entries = count, "final grades synced");
        Ok(sheet)
    }
}

fn ensure_section_free(db: &Database, section: SectionId) -> Result<(), StoreError> {
    if db.gradebook_for_section(section).is_some() {
        Err(StoreError::Conflict(format!(
            "section {section} already has a grade book"
        )))
    } else {
        Ok(())
    }
}

fn ensure_grade(grade: f64) -> Result<(), RuleViolation> {
    if grade.is_finite() && (0.0..=100.0).contains(&grade) {
        Ok(())
    } else {
        Err(RuleViolation::invalid("grade", "must be between 0 and 100"))
    }
}

fn validate_tree(periods: &[PeriodInput]) -> Result<(), RuleViolation> {
    let mut period_titles = Vec::new();
    for period in periods {
        ensure_named("period title", &period.title)?;
        ensure_weight(period.weight)?;
        if period_titles.contains(&period.title.as_str()) {
            return Err(RuleViolation::invalid("period title", format!("{} is repeated", period.title)));
        }
        period_titles.push(period.title.as_str());

        for item in &period.items {
            ensure_named("item title", &item.title)?;
            ensure_weight(item.weight)?;
            let mut detail_titles = Vec::new();
            for detail in &item.details {
                validate_detail(detail)?;
                if detail_titles.contains(&detail.title.as_str()) {
                    return Err(RuleViolation::invalid(
                        "detail title",
                        format!("{} is repeated", detail.title),
                    ));
                }
                detail_titles.push(detail.title.as_str());
            }
        }
    }
    Ok(())
}

fn validate_detail(detail: &DetailInput) -> Result<(), RuleViolation> {
    ensure_named("detail title", &detail.title)?;
    ensure_weight(detail.weight)?;
    if !detail.max_score.is_finite()
        || !detail.min_score.is_finite()
        || detail.min_score < 0.0
        || detail.max_score < detail.min_score
    {
        return Err(RuleViolation::invalid(
            "max_score",
            "must be at least min_score, which must be non-negative",
        ));
    }
    Ok(())
}

fn ensure_weight(weight: f64) -> Result<(), RuleViolation> {
    if weight.is_finite() && weight > 0.0 && weight <= 100.0 {
        Ok(())
    } else {
        Err(RuleViolation::invalid("weight", "must be greater than 0 and at most 100"))
    }
}
