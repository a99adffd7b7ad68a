//! Weighted scoring of program admission applications and the auto-acceptance hook.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::program::{
    AdmissionApplicationId, AdmissionLog, AdmissionScore, AdmissionStatus, ProgramCriteriaId,
};
use crate::designations::UserId;
use crate::store::{Database, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreContribution {
    pub criteria_id: ProgramCriteriaId,
    pub title: String,
    pub evaluator: UserId,
    pub score: f64,
    pub max_score: f64,
    pub weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub admission_application_id: AdmissionApplicationId,
    pub criteria_count: usize,
    pub posted_count: usize,
    pub is_complete: bool,
    pub total_weight: f64,
    pub percent: f64,
    pub threshold: f64,
    pub is_passing: bool,
    pub contributions: Vec<ScoreContribution>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ScoringOutcome {
    Accepted(AdmissionLog),
    Revoked(usize),
    Unchanged,
}

impl Database {
    /// Every active criterion of the program needs a posted score before the percentage counts.
    pub(crate) fn evaluate_admission(
        &self,
        application: AdmissionApplicationId,
        threshold: f64,
    ) -> Result<Evaluation, StoreError> {
        let record = self.admission_applications.require(application)?;
        let (program, school_year) = self.application_scope(record)?;

        let criteria_count = self
            .program_criteria
            .filter(|criteria| {
                criteria.academic_program_id == program
                    && criteria.school_year_id == school_year
                    && criteria.is_active
            })
            .count();

        let posted: Vec<&AdmissionScore> = self
            .admission_scores
            .filter(|score| score.admission_application_id == application && score.is_posted)
            .collect();
        let posted_count = posted
            .iter()
            .map(|score| (score.criteria_id, score.user_id))
            .collect::<BTreeSet<_>>()
            .len();

        let contributions: Vec<ScoreContribution> = posted
            .iter()
            .filter_map(|score| {
                let criteria = self.program_criteria.get(score.criteria_id)?;
                if !criteria.is_active || criteria.max_score <= 0.0 {
                    return None;
                }
                Some(ScoreContribution {
                    criteria_id: criteria.id,
                    title: criteria.title.clone(),
                    evaluator: score.user_id,
                    score: score.score,
                    max_score: criteria.max_score,
                    weight: criteria.weight,
                    contribution: score.score / criteria.max_score * criteria.weight,
                })
            })
            .collect();

        let total_weight: f64 = contributions.iter().map(|row| row.weight).sum();
        let weighted: f64 = contributions.iter().map(|row| row.contribution).sum();
        let percent = if total_weight > 0.0 {
            weighted / total_weight * 100.0
        } else {
            0.0
        };
        let is_complete = posted_count >= criteria_count;

        Ok(Evaluation {
            admission_application_id: application,
            criteria_count,
            posted_count,
            is_complete,
            total_weight,
            percent,
            threshold,
            is_passing: is_complete && percent >= threshold,
            contributions,
        })
    }

    /// Re-derives the `accepted` log after `score` was written.
    pub(crate) fn apply_scoring_hook(
        &mut self,
        score: &AdmissionScore,
        inserted: bool,
        threshold: f64,
        now: NaiveDateTime,
    ) -> Result<ScoringOutcome, StoreError> {
        let application = score.admission_application_id;
        if inserted && !score.is_posted {
            return Ok(self.revoke_acceptance(application));
        }

        let evaluation = self.evaluate_admission(application, threshold)?;
        if !evaluation.is_passing {
            return Ok(self.revoke_acceptance(application));
        }

        let already_accepted = self.admission_logs.any(|log| {
            log.admission_application_id == application && log.status == AdmissionStatus::Accepted
        });
        if already_accepted {
            return Ok(ScoringOutcome::Unchanged);
        }

        let log = self.admission_logs.insert_with(|id| AdmissionLog {
            id,
            admission_application_id: application,
            user_id: score.user_id,
            status: AdmissionStatus::Accepted,
            note: Some(format!(
                "Automatically accepted with score: {:.2}%",
                evaluation.percent
            )),
            created_at: now,
        });
        Ok(ScoringOutcome::Accepted(log))
    }

    fn revoke_acceptance(&mut self, application: AdmissionApplicationId) -> ScoringOutcome {
        let removed = self.admission_logs.remove_where(|log| {
            log.admission_application_id == application && log.status == AdmissionStatus::Accepted
        });
        if removed == 0 {
            ScoringOutcome::Unchanged
        } else {
            ScoringOutcome::Revoked(removed)
        }
    }
}
