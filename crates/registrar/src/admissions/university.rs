//! University-wide admission windows, entrance criteria, exam schedules, and applications.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::AdmissionStatus;
use crate::academics::{RequirementId, SchoolYearId, TestingCenterId};
use crate::designations::UserId;
use crate::store::{record, record_id, Database};

record_id!(UniversityAdmissionId);
record_id!(UniversityCriteriaId);
record_id!(UniversityScheduleId);
record_id!(UniversityApplicationId);
record_id!(UniversityLogId);
record_id!(CriteriaSubmissionId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniversityAdmission {
    pub id: UniversityAdmissionId,
    pub school_year_id: SchoolYearId,
    pub open_date: NaiveDate,
    pub close_date: NaiveDate,
    pub is_open_override: bool,
}

record!(UniversityAdmission, UniversityAdmissionId, "university admission");

impl UniversityAdmission {
    pub fn window_contains(&self, date: NaiveDate) -> bool {
        self.open_date <= date && date <= self.close_date
    }

    /// The override flag keeps the admission open outside its window.
    pub fn is_ongoing(&self, today: NaiveDate) -> bool {
        self.is_open_override || self.window_contains(today)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversityCriteria {
    pub id: UniversityCriteriaId,
    pub university_admission_id: UniversityAdmissionId,
    pub requirement_id: RequirementId,
    pub title: String,
    pub description: Option<String>,
    pub max_score: f64,
    pub min_score: f64,
    pub weight: f64,
    pub is_active: bool,
    pub file_suffix: Option<String>,
}

record!(UniversityCriteria, UniversityCriteriaId, "university admission criteria");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniversitySchedule {
    pub id: UniversityScheduleId,
    pub university_admission_id: UniversityAdmissionId,
    pub testing_center_id: TestingCenterId,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
}

record!(UniversitySchedule, UniversityScheduleId, "university admission schedule");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversityApplication {
    pub id: UniversityApplicationId,
    pub university_admission_id: UniversityAdmissionId,
    pub university_schedule_id: Option<UniversityScheduleId>,
    pub user_id: UserId,
    pub is_passed: bool,
    pub score: f64,
    pub remark: String,
    pub year: i32,
    pub pool_no: u32,
    pub created_at: NaiveDateTime,
}

record!(UniversityApplication, UniversityApplicationId, "university admission application");

impl UniversityApplication {
    /// `<year><pool_no>` with the pool number padded to six digits.
    pub fn temporary_id(&self) -> String {
        format!("{}{:06}", self.year, self.pool_no)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniversityLog {
    pub id: UniversityLogId,
    pub university_application_id: UniversityApplicationId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub status: AdmissionStatus,
    pub note: Option<String>,
    pub created_at: NaiveDateTime,
}

record!(UniversityLog, UniversityLogId, "university admission application log");

/// Reference to an uploaded file; contents live in external storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionFile {
    pub name: String,
    pub storage_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaSubmission {
    pub id: CriteriaSubmissionId,
    pub university_application_id: UniversityApplicationId,
    pub university_criteria_id: UniversityCriteriaId,
    pub file: SubmissionFile,
}

record!(CriteriaSubmission, CriteriaSubmissionId, "criteria submission");

#[derive(Debug, Clone, Deserialize)]
pub struct UniversityAdmissionInput {
    pub school_year_id: SchoolYearId,
    pub open_date: NaiveDate,
    pub close_date: NaiveDate,
    #[serde(default)]
    pub is_open_override: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UniversityCriteriaInput {
    pub requirement_id: RequirementId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub max_score: f64,
    #[serde(default)]
    pub min_score: f64,
    pub weight: f64,
    #[serde(default = "crate::academics::default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub file_suffix: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UniversityScheduleInput {
    pub testing_center_id: TestingCenterId,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CriteriaFileInput {
    pub university_criteria_id: UniversityCriteriaId,
    #[serde(default)]
    pub file: Option<SubmissionFile>,
}

/// Application plus one file per criterion, stored together or not at all.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationFormInput {
    pub user_id: UserId,
    #[serde(default)]
    pub university_schedule_id: Option<UniversityScheduleId>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub submissions: Vec<CriteriaFileInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UniversityAdmissionView {
    #[serde(flatten)]
    pub admission: UniversityAdmission,
    pub is_ongoing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UniversityApplicationView {
    #[serde(flatten)]
    pub application: UniversityApplication,
    pub temporary_id: String,
    pub latest_status: Option<AdmissionStatus>,
    pub latest_status_label: &'static str,
    pub submissions: Vec<CriteriaSubmission>,
}

impl Database {
    pub(crate) fn university_application_view(
        &self,
        application: &UniversityApplication,
    ) -> UniversityApplicationView {
        let latest_status = self
            .university_logs
            .filter(|log| log.university_application_id == application.id)
            .last()
            .map(|log| log.status);

        UniversityApplicationView {
            temporary_id: application.temporary_id(),
            latest_status,
            latest_status_label: latest_status.map_or("Unknown Status", AdmissionStatus::label),
            submissions: self
                .criteria_submissions
                .filter(|row| row.university_application_id == application.id)
                .cloned()
                .collect(),
            application: application.clone(),
        }
    }

    /// The soonest-closing admission still accepting applications that `user` has not applied to.
    pub(crate) fn invitation_for(
        &self,
        user: UserId,
        today: NaiveDate,
    ) -> Option<&UniversityAdmission> {
        self.university_admissions
            .filter(move |admission| admission.close_date >= today)
            .filter(|admission| {
                !self.university_applications.any(|application| {
                    application.university_admission_id == admission.id
                        && application.user_id == user
                })
            })
            .min_by_key(|admission| (admission.close_date, admission.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn admission(db: &mut Database, open: NaiveDate, close: NaiveDate) -> UniversityAdmission {
        db.university_admissions.insert_with(|id| UniversityAdmission {
            id,
            school_year_id: SchoolYearId(1),
            open_date: open,
            close_date: close,
            is_open_override: false,
        })
    }

    #[test]
    fn override_keeps_admission_ongoing() {
        let mut db = Database::default();
        let mut admission = admission(&mut db, date(2025, 3, 1), date(2025, 5, 31));
        assert!(admission.is_ongoing(date(2025, 4, 1)));
        assert!(!admission.is_ongoing(date(2025, 6, 1)));
        admission.is_open_override = true;
        assert!(admission.is_ongoing(date(2025, 6, 1)));
    }

    #[test]
    fn temporary_id_pads_pool_number() {
        let application = UniversityApplication {
            id: UniversityApplicationId(1),
            university_admission_id: UniversityAdmissionId(1),
            university_schedule_id: None,
            user_id: UserId(1),
            is_passed: false,
            score: 0.0,
            remark: String::new(),
            year: 2025,
            pool_no: 42,
            created_at: date(2025, 4, 1).and_hms_opt(8, 0, 0).expect("valid time"),
        };
        assert_eq!(application.temporary_id(), "2025000042");
    }

    #[test]
    fn invitation_skips_closed_and_applied_admissions() {
        let mut db = Database::default();
        admission(&mut db, date(2024, 3, 1), date(2024, 5, 31));
        let applied = admission(&mut db, date(2025, 3, 1), date(2025, 4, 30));
        let open = admission(&mut db, date(2025, 3, 15), date(2025, 6, 30));
        db.university_applications.insert_with(|id| UniversityApplication {
            id,
            university_admission_id: applied.id,
            university_schedule_id: None,
            user_id: UserId(9),
            is_passed: false,
            score: 0.0,
            remark: String::new(),
            year: 2025,
            pool_no: 1,
            created_at: date(2025, 3, 2).and_hms_opt(8, 0, 0).expect("valid time"),
        });

        let today = date(2025, 4, 1);
        assert_eq!(db.invitation_for(UserId(9), today).map(|a| a.id), Some(open.id));
        assert_eq!(db.invitation_for(UserId(3), today).map(|a| a.id), Some(applied.id));
    }
}
