//! Student enrollments in sections and their approval trail.

mod router;
mod service;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::academics::SectionId;
use crate::designations::UserId;
use crate::store::{record, record_id, Database};

pub use router::router;
pub use service::{EnrollmentFilter, EnrollmentService};

record_id!(EnrollmentId);
record_id!(EnrollmentLogId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub section_id: SectionId,
    pub created_at: NaiveDateTime,
}

record!(Enrollment, EnrollmentId, "enrollment");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentAction {
    Enroll,
    ProgramChairApproved,
    RegistrarApproved,
    ProgramChairDroppedApproved,
    RegistrarDroppedApproved,
    Dropped,
    Rejected,
}

impl EnrollmentAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            EnrollmentAction::Enroll => "enroll",
            EnrollmentAction::ProgramChairApproved => "program_chair_approved",
            EnrollmentAction::RegistrarApproved => "registrar_approved",
            EnrollmentAction::ProgramChairDroppedApproved => "program_chair_dropped_approved",
            EnrollmentAction::RegistrarDroppedApproved => "registrar_dropped_approved",
            EnrollmentAction::Dropped => "dropped",
            EnrollmentAction::Rejected => "rejected",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            EnrollmentAction::Enroll => "Pending",
            EnrollmentAction::ProgramChairApproved => "Program Chair Approved",
            EnrollmentAction::RegistrarApproved => "Officially Enrolled",
            EnrollmentAction::Dropped => "Dropped Requested",
            EnrollmentAction::ProgramChairDroppedApproved => "Dropped Approved by Program Chair",
            EnrollmentAction::RegistrarDroppedApproved => "Officially Dropped",
            EnrollmentAction::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentLog {
    pub id: EnrollmentLogId,
    pub enrollment_id: EnrollmentId,
    pub user_id: UserId,
    pub logged_by: UserId,
    pub action: EnrollmentAction,
    pub created_at: NaiveDateTime,
}

record!(EnrollmentLog, EnrollmentLogId, "enrollment log");

#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentInput {
    pub user_id: UserId,
    pub section_id: SectionId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentLogInput {
    pub action: EnrollmentAction,
    pub logged_by: UserId,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentView {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub latest_status: EnrollmentAction,
    pub latest_status_label: &'static str,
    pub is_validated: bool,
    pub is_dropped: bool,
}

impl Database {
    fn enrollment_has(&self, enrollment: EnrollmentId, action: EnrollmentAction) -> bool {
        self.enrollment_logs
            .any(|log| log.enrollment_id == enrollment && log.action == action)
    }

    /// Dropped only once the registrar signs off on the drop.
    pub(crate) fn is_dropped(&self, enrollment: EnrollmentId) -> bool {
        self.enrollment_has(enrollment, EnrollmentAction::Dropped)
            && self.enrollment_has(enrollment, EnrollmentAction::RegistrarDroppedApproved)
    }

    pub(crate) fn is_validated(&self, enrollment: EnrollmentId) -> bool {
        self.enrollment_has(enrollment, EnrollmentAction::ProgramChairApproved)
            && self.enrollment_has(enrollment, EnrollmentAction::RegistrarApproved)
            && !self.is_dropped(enrollment)
    }

    /// Grade sheets list registrar-approved enrollments whose drop was not approved.
    pub(crate) fn is_on_roster(&self, enrollment: EnrollmentId) -> bool {
        self.enrollment_has(enrollment, EnrollmentAction::RegistrarApproved)
            && !self.enrollment_has(enrollment, EnrollmentAction::RegistrarDroppedApproved)
    }

    pub(crate) fn validated_enrollment_count(&self, section: SectionId) -> usize {
        self.enrollments
            .filter(|row| row.section_id == section)
            .filter(|row| self.is_validated(row.id))
            .count()
    }

    pub(crate) fn is_student(&self, user: UserId) -> bool {
        self.enrollments
            .any(|row| row.user_id == user && self.is_validated(row.id))
    }

    pub(crate) fn latest_enrollment_status(&self, enrollment: EnrollmentId) -> EnrollmentAction {
        self.enrollment_logs
            .filter(|log| log.enrollment_id == enrollment)
            .last()
            .map(|log| log.action)
            .unwrap_or(EnrollmentAction::Enroll)
    }

    pub(crate) fn enrollment_view(&self, enrollment: &Enrollment) -> EnrollmentView {
        let latest_status = self.latest_enrollment_status(enrollment.id);
        EnrollmentView {
            latest_status,
            latest_status_label: latest_status.label(),
            is_validated: self.is_validated(enrollment.id),
            is_dropped: self.is_dropped(enrollment.id),
            enrollment: enrollment.clone(),
        }
    }
}

/// Which logged actions may follow the current state of an enrollment.
pub(crate) fn allowed_after(history: &[EnrollmentAction], next: EnrollmentAction) -> bool {
    use EnrollmentAction::*;

    let has = |action| history.contains(&action);
    if has(Rejected) || has(RegistrarDroppedApproved) {
        return false;
    }
    match next {
        Enroll => false,
        ProgramChairApproved => !has(Dropped),
        RegistrarApproved => has(ProgramChairApproved) && !has(Dropped),
        Dropped => true,
        ProgramChairDroppedApproved => has(Dropped),
        RegistrarDroppedApproved => has(Dropped),
        Rejected => !has(RegistrarApproved),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 11)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn enroll(db: &mut Database, user: u64, actions: &[EnrollmentAction]) -> EnrollmentId {
        let enrollment = db.enrollments.insert_with(|id| Enrollment {
            id,
            user_id: UserId(user),
            section_id: SectionId(1),
            created_at: at(),
        });
        for action in [EnrollmentAction::Enroll].iter().chain(actions) {
            db.enrollment_logs.insert_with(|id| EnrollmentLog {
                id,
                enrollment_id: enrollment.id,
                user_id: UserId(user),
                logged_by: UserId(user),
                action: *action,
                created_at: at(),
            });
        }
        enrollment.id
    }

    #[test]
    fn validation_needs_both_approvals() {
        use EnrollmentAction::*;
        let mut db = Database::default();
        let pending = enroll(&mut db, 1, &[ProgramChairApproved]);
        let enrolled = enroll(&mut db, 2, &[ProgramChairApproved, RegistrarApproved]);

        assert!(!db.is_validated(pending));
        assert!(db.is_validated(enrolled));
        assert_eq!(db.validated_enrollment_count(SectionId(1)), 1);
        assert!(db.is_student(UserId(2)));
        assert!(!db.is_student(UserId(1)));
        assert_eq!(db.latest_enrollment_status(enrolled), RegistrarApproved);
    }

    #[test]
    fn approved_drop_removes_student_from_roster() {
        use EnrollmentAction::*;
        let mut db = Database::default();
        let requested = enroll(
            &mut db,
            1,
            &[ProgramChairApproved, RegistrarApproved, Dropped],
        );
        let dropped = enroll(
            &mut db,
            2,
            &[
                ProgramChairApproved,
                RegistrarApproved,
                Dropped,
                RegistrarDroppedApproved,
            ],
        );

        assert!(db.is_validated(requested));
        assert!(db.is_on_roster(requested));
        assert!(db.is_dropped(dropped));
        assert!(!db.is_validated(dropped));
        assert!(!db.is_on_roster(dropped));
        assert_eq!(db.latest_enrollment_status(dropped).label(), "Officially Dropped");
    }

    #[test]
    fn transitions_follow_the_approval_chain() {
        use EnrollmentAction::*;
        assert!(!allowed_after(&[Enroll], RegistrarApproved));
        assert!(allowed_after(&[Enroll, ProgramChairApproved], RegistrarApproved));
        assert!(!allowed_after(&[Enroll], RegistrarDroppedApproved));
        assert!(!allowed_after(&[Enroll, Rejected], ProgramChairApproved));
        assert!(!allowed_after(&[Enroll], Enroll));
        assert!(allowed_after(
            &[Enroll, ProgramChairApproved, RegistrarApproved],
            Dropped
        ));
    }
}
