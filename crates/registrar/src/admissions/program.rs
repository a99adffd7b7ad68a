//! Per-program admission schedules, criteria, applications, and evaluator scores.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::university::UniversityAdmissionId;
use crate::academics::{AcademicProgramId, SchoolYearId};
use crate::designations::UserId;
use crate::store::{record, record_id, Database, StoreError};

record_id!(AdmissionScheduleId);
record_id!(ProgramCriteriaId);
record_id!(AdmissionApplicationId);
record_id!(AdmissionLogId);
record_id!(AdmissionScoreId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionSchedule {
    pub id: AdmissionScheduleId,
    pub university_admission_id: UniversityAdmissionId,
    pub academic_program_id: AcademicProgramId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

record!(AdmissionSchedule, AdmissionScheduleId, "admission schedule");

impl AdmissionSchedule {
    pub fn is_open_for_enrollment(&self, today: NaiveDate) -> bool {
        self.start_date <= today && today <= self.end_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramCriteria {
    pub id: ProgramCriteriaId,
    pub academic_program_id: AcademicProgramId,
    pub school_year_id: SchoolYearId,
    pub title: String,
    pub description: Option<String>,
    pub max_score: f64,
    pub min_score: f64,
    pub weight: f64,
    pub is_active: bool,
}

record!(ProgramCriteria, ProgramCriteriaId, "academic program criteria");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionStatus {
    Submitted,
    Approved,
    Rejected,
    Accepted,
    Cancelled,
}

impl AdmissionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            AdmissionStatus::Submitted => "submitted",
            AdmissionStatus::Approved => "approved",
            AdmissionStatus::Rejected => "rejected",
            AdmissionStatus::Accepted => "accepted",
            AdmissionStatus::Cancelled => "cancelled",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            AdmissionStatus::Submitted => "Pending",
            AdmissionStatus::Approved => "Approved for Evaluation",
            AdmissionStatus::Rejected => "Rejected by Program Chair",
            AdmissionStatus::Accepted => "Ready for Enrollment",
            AdmissionStatus::Cancelled => "Cancelled by Student",
        }
    }

    /// Written by the system, never through a manual decision.
    pub const fn is_system_managed(self) -> bool {
        matches!(self, AdmissionStatus::Submitted | AdmissionStatus::Accepted)
    }

    pub const fn is_closed(self) -> bool {
        matches!(self, AdmissionStatus::Rejected | AdmissionStatus::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionApplication {
    pub id: AdmissionApplicationId,
    pub user_id: UserId,
    pub admission_schedule_id: AdmissionScheduleId,
    pub year: i32,
    pub pool_no: u32,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: NaiveDateTime,
}

record!(AdmissionApplication, AdmissionApplicationId, "admission application");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionLog {
    pub id: AdmissionLogId,
    pub admission_application_id: AdmissionApplicationId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub status: AdmissionStatus,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
}

record!(AdmissionLog, AdmissionLogId, "admission application log");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionScore {
    pub id: AdmissionScoreId,
    pub admission_application_id: AdmissionApplicationId,
    pub criteria_id: ProgramCriteriaId,
    pub user_id: UserId,
    pub score: f64,
    pub comments: Option<String>,
    pub is_posted: bool,
}

record!(AdmissionScore, AdmissionScoreId, "admission application score");

#[derive(Debug, Clone, Deserialize)]
pub struct AdmissionScheduleInput {
    pub university_admission_id: UniversityAdmissionId,
    pub academic_program_id: AcademicProgramId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgramCriteriaInput {
    pub academic_program_id: AcademicProgramId,
    pub school_year_id: SchoolYearId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub max_score: f64,
    #[serde(default)]
    pub min_score: f64,
    pub weight: f64,
    #[serde(default = "crate::academics::default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdmissionApplicationInput {
    pub user_id: UserId,
    pub admission_schedule_id: AdmissionScheduleId,
    #[serde(default)]
    pub year: Option<i32>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionInput {
    pub status: AdmissionStatus,
    pub user_id: UserId,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreInput {
    pub criteria_id: ProgramCriteriaId,
    pub user_id: UserId,
    pub score: f64,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub is_posted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdmissionApplicationView {
    #[serde(flatten)]
    pub application: AdmissionApplication,
    pub academic_program_id: Option<AcademicProgramId>,
    pub latest_status: AdmissionStatus,
    pub latest_status_label: &'static str,
    pub is_open_for_enrollment: bool,
}

/// Next pool number: one past the highest already issued for the year.
pub(crate) fn next_pool_no(issued: impl Iterator<Item = u32>) -> u32 {
    issued.max().unwrap_or(0) + 1
}

impl Database {
    pub(crate) fn latest_admission_status(
        &self,
        application: AdmissionApplicationId,
    ) -> AdmissionStatus {
        self.admission_logs
            .filter(|log| log.admission_application_id == application)
            .last()
            .map(|log| log.status)
            .unwrap_or(AdmissionStatus::Submitted)
    }

    /// Program and school year an application is evaluated against.
    pub(crate) fn application_scope(
        &self,
        application: &AdmissionApplication,
    ) -> Result<(AcademicProgramId, SchoolYearId), StoreError> {
        let schedule = self
            .admission_schedules
            .require(application.admission_schedule_id)?;
        let admission = self
            .university_admissions
            .require(schedule.university_admission_id)?;
        Ok((schedule.academic_program_id, admission.school_year_id))
    }

    pub(crate) fn admission_application_view(
        &self,
        application: &AdmissionApplication,
        today: NaiveDate,
    ) -> AdmissionApplicationView {
        let schedule = self
            .admission_schedules
            .get(application.admission_schedule_id);
        let latest_status = self.latest_admission_status(application.id);

        AdmissionApplicationView {
            academic_program_id: schedule.map(|schedule| schedule.academic_program_id),
            latest_status,
            latest_status_label: latest_status.label(),
            is_open_for_enrollment: schedule
                .map_or(false, |schedule| schedule.is_open_for_enrollment(today)),
            application: application.clone(),
        }
    }
}
