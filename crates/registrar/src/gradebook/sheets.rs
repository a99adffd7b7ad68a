//! Score, period-grade, and final-grade sheets for a section roster.

use serde::{Deserialize, Serialize};

use super::{
    round2, FinalGrade, GradeBook, GradeBookItemDetailId, GradingPeriodId, FULL_WEIGHT,
};
use crate::academics::SectionId;
use crate::designations::UserId;
use crate::enrollment::{Enrollment, EnrollmentId};
use crate::service::{RuleViolation, ServiceError};
use crate::store::Database;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCell {
    pub grading_period_id: GradingPeriodId,
    pub detail_id: GradeBookItemDetailId,
    pub max_score: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow {
    pub enrollment_id: EnrollmentId,
    pub user_id: UserId,
    pub student_name: String,
    pub scores: Vec<ScoreCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSheet {
    pub section_id: SectionId,
    pub rows: Vec<ScoreRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreEntry {
    pub enrollment_id: EnrollmentId,
    pub detail_id: GradeBookItemDetailId,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodGradeCell {
    pub grading_period_id: GradingPeriodId,
    pub title: String,
    pub weight: f64,
    pub recommended_grade: f64,
    pub grade: f64,
    pub is_overridden: bool,
    pub is_posted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodGradeRow {
    pub enrollment_id: EnrollmentId,
    pub user_id: UserId,
    pub student_name: String,
    pub periods: Vec<PeriodGradeCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodGradeSheet {
    pub section_id: SectionId,
    pub rows: Vec<PeriodGradeRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeriodGradeEntry {
    pub enrollment_id: EnrollmentId,
    pub grading_period_id: GradingPeriodId,
    pub grade: f64,
    #[serde(default)]
    pub is_posted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalGradeRow {
    pub enrollment_id: EnrollmentId,
    pub user_id: UserId,
    pub student_name: String,
    pub recommended_grade: f64,
    pub grade: f64,
    pub credited_units: f64,
    pub is_passed: bool,
    pub is_posted: bool,
    pub is_overridden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalGradeSheet {
    pub section_id: SectionId,
    pub passing_grade: f64,
    pub rows: Vec<FinalGradeRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinalGradeEntry {
    pub enrollment_id: EnrollmentId,
    pub grade: f64,
    #[serde(default)]
    pub credited_units: Option<f64>,
    #[serde(default)]
    pub is_posted: bool,
}

impl Database {
    /// Registrar-approved enrollments of `section` whose drop was not approved.
    pub(crate) fn section_roster(&self, section: SectionId) -> Vec<&Enrollment> {
        self.enrollments
            .filter(move |row| row.section_id == section)
            .filter(|row| self.is_on_roster(row.id))
            .collect()
    }

    pub(crate) fn require_section_gradebook(
        &self,
        section: SectionId,
    ) -> Result<&GradeBook, ServiceError> {
        self.sections.require(section)?;
        self.gradebook_for_section(section)
            .ok_or_else(|| RuleViolation::MissingGradeBook.into())
    }

    pub(crate) fn ensure_on_roster(
        &self,
        section: SectionId,
        enrollment: EnrollmentId,
    ) -> Result<(), RuleViolation> {
        let listed = self
            .enrollments
            .get(enrollment)
            .map_or(false, |row| row.section_id == section && self.is_on_roster(row.id));
        if listed {
            Ok(())
        } else {
            Err(RuleViolation::NotOnRoster {
                enrollment: enrollment.0,
            })
        }
    }

    fn student_name(&self, user: UserId) -> String {
        self.users
            .get(user)
            .map(|user| user.name.clone())
            .unwrap_or_default()
    }

    fn stored_score(&self, detail: GradeBookItemDetailId, enrollment: EnrollmentId) -> Option<f64> {
        self.gradebook_scores
            .find(|row| row.detail_id == detail && row.enrollment_id == enrollment)
            .map(|row| row.score)
    }

    pub(crate) fn score_sheet(&self, section: SectionId) -> Result<ScoreSheet, ServiceError> {
        let gradebook = self.require_section_gradebook(section)?;
        let mut layout = Vec::new();
        for period in self.periods_of(gradebook.id) {
            for item in self.items_of(period.id) {
                for detail in self.details_of(item.id) {
                    layout.push((period.id, detail.id, detail.max_score));
                }
            }
        }

        let rows = self
            .section_roster(section)
            .into_iter()
            .map(|enrollment| ScoreRow {
                enrollment_id: enrollment.id,
                user_id: enrollment.user_id,
                student_name: self.student_name(enrollment.user_id),
                scores: layout
                    .iter()
                    .map(|&(grading_period_id, detail_id, max_score)| ScoreCell {
                        grading_period_id,
                        detail_id,
                        max_score,
                        score: self.stored_score(detail_id, enrollment.id).unwrap_or(0.0),
                    })
                    .collect(),
            })
            .collect();

        Ok(ScoreSheet {
            section_id: section,
            rows,
        })
    }

    /// Weighted sum of detail scores, scaled by each item's share of the period.
    pub(crate) fn recommended_period_grade(
        &self,
        period: GradingPeriodId,
        enrollment: EnrollmentId,
    ) -> f64 {
        let total: f64 = self
            .items_of(period)
            .flat_map(|item| {
                self.details_of(item.id)
                    .filter(|detail| detail.max_score > 0.0)
                    .map(move |detail| (item.weight, detail))
            })
            .map(|(item_weight, detail)| {
                let score = self.stored_score(detail.id, enrollment).unwrap_or(0.0);
                score / detail.max_score * detail.weight * (item_weight / FULL_WEIGHT)
            })
            .sum();
        round2(total)
    }

    pub(crate) fn period_grade_sheet(
        &self,
        section: SectionId,
    ) -> Result<PeriodGradeSheet, ServiceError> {
        let gradebook = self.require_section_gradebook(section)?;
        let periods: Vec<_> = self.periods_of(gradebook.id).collect();

        let rows = self
            .section_roster(section)
            .into_iter()
            .map(|enrollment| PeriodGradeRow {
                enrollment_id: enrollment.id,
                user_id: enrollment.user_id,
                student_name: self.student_name(enrollment.user_id),
                periods: periods
                    .iter()
                    .map(|period| {
                        let recommended = self.recommended_period_grade(period.id, enrollment.id);
                        let stored = self.period_grades.find(|row| {
                            row.grading_period_id == period.id && row.enrollment_id == enrollment.id
                        });
                        let grade = stored.map_or(recommended, |row| row.grade);
                        PeriodGradeCell {
                            grading_period_id: period.id,
                            title: period.title.clone(),
                            weight: period.weight,
                            recommended_grade: recommended,
                            grade,
                            is_overridden: stored.is_some() && grade != recommended,
                            is_posted: stored.map_or(false, |row| row.is_posted),
                        }
                    })
                    .collect(),
            })
            .collect();

        Ok(PeriodGradeSheet {
            section_id: section,
            rows,
        })
    }

    /// Posted period grades weighted by their period.
    pub(crate) fn recommended_final_grade(
        &self,
        gradebook: &GradeBook,
        enrollment: EnrollmentId,
    ) -> f64 {
        let total: f64 = self
            .periods_of(gradebook.id)
            .filter_map(|period| {
                self.period_grades
                    .find(|row| {
                        row.grading_period_id == period.id
                            && row.enrollment_id == enrollment
                            && row.is_posted
                    })
                    .map(|row| row.grade * period.weight / FULL_WEIGHT)
            })
            .sum();
        round2(total)
    }

    /// Credit units of the course behind `section`.
    pub(crate) fn section_credit_units(&self, section: SectionId) -> f64 {
        self.sections
            .get(section)
            .and_then(|section| self.curriculum_details.get(section.curriculum_detail_id))
            .and_then(|detail| self.courses.get(detail.course_id))
            .map_or(0.0, |course| course.credit_units)
    }

    pub(crate) fn final_grade_sheet(
        &self,
        section: SectionId,
        passing_grade: f64,
    ) -> Result<FinalGradeSheet, ServiceError> {
        let gradebook = self.require_section_gradebook(section)?;
        let units = self.section_credit_units(section);

        let rows = self
            .section_roster(section)
            .into_iter()
            .map(|enrollment| {
                let recommended = self.recommended_final_grade(gradebook, enrollment.id);
                let stored: Option<&FinalGrade> = self
                    .final_grades
                    .find(|row| row.enrollment_id == enrollment.id);
                let grade = stored.map_or(recommended, |row| row.grade);
                let is_passed = grade >= passing_grade;
                FinalGradeRow {
                    enrollment_id: enrollment.id,
                    user_id: enrollment.user_id,
                    student_name: self.student_name(enrollment.user_id),
                    recommended_grade: recommended,
                    grade,
                    credited_units: stored.map_or(
                        if is_passed { units } else { 0.0 },
                        |row| row.credited_units,
                    ),
                    is_passed,
                    is_posted: stored.map_or(false, |row| row.is_posted),
                    is_overridden: stored.is_some() && grade != recommended,
                }
            })
            .collect();

        Ok(FinalGradeSheet {
            section_id: section,
            passing_grade,
            rows,
        })
    }
}
