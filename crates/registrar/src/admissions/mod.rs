//! Admissions: the university-wide entrance process and per-program evaluation.
//!
//! Program applications are scored by evaluators against weighted criteria. Whenever a score
//! is written the acceptance hook re-derives the `accepted` log inside the same write, and the
//! applicant is notified once the write commits.

pub(crate) mod evaluation;
pub mod program;
pub mod router;
pub mod service;
pub mod university;
pub mod university_service;

#[cfg(test)]
mod tests;

pub use evaluation::{Evaluation, ScoreContribution};
pub use program::{
    AdmissionApplication, AdmissionApplicationId, AdmissionApplicationInput,
    AdmissionApplicationView, AdmissionLog, AdmissionLogId, AdmissionSchedule,
    AdmissionScheduleId, AdmissionScheduleInput, AdmissionScore, AdmissionScoreId,
    AdmissionStatus, DecisionInput, ProgramCriteria, ProgramCriteriaId, ProgramCriteriaInput,
    ScoreInput,
};
pub use router::{admission_router, university_router};
pub use service::{AdmissionService, CriteriaFilter, ScoringResult};
pub use university::{
    ApplicationFormInput, CriteriaFileInput, CriteriaSubmission, CriteriaSubmissionId,
    SubmissionFile, UniversityAdmission, UniversityAdmissionId, UniversityAdmissionInput,
    UniversityAdmissionView, UniversityApplication, UniversityApplicationId,
    UniversityApplicationView, UniversityCriteria, UniversityCriteriaId, UniversityCriteriaInput,
    UniversityLog, UniversityLogId, UniversitySchedule, UniversityScheduleId,
    UniversityScheduleInput,
};
pub use university_service::{ExamResultInput, UniversityAdmissionService};
