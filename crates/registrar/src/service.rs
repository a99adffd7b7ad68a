//! Error vocabulary and shared dependencies for the domain services.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use crate::clock::Clock;
use crate::config::PolicyConfig;
use crate::notifications::{NotificationDraft, NotificationError, NotificationPublisher};
use crate::store::{Database, Store, StoreError};

/// Business rule broken by a request. Surfaces as `422 Unprocessable Entity`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleViolation {
    #[error("end date {end} precedes start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("end time {end} must be after start time {start}")]
    InvalidTimeRange { start: NaiveTime, end: NaiveTime },
    #[error("school year dates overlap with existing school year {code}")]
    SchoolYearOverlap { code: String },
    #[error("only one school year can be active at a time")]
    MultipleActiveSchoolYears,
    #[error("{what} must fall within the school year")]
    OutsideSchoolYear { what: &'static str },
    #[error("{what} must fall within the university admission window")]
    OutsideAdmissionWindow { what: &'static str },
    #[error("university admission is not open for applications")]
    AdmissionNotOngoing,
    #[error("a course cannot be its own requisite")]
    SelfRequisite,
    #[error("room is already booked on {day} during that time")]
    RoomDoubleBooked { day: String },
    #[error("section is full")]
    SectionFull,
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("score {score} must be between 0 and {max}")]
    ScoreOutOfRange { score: f64, max: f64 },
    #[error("criteria does not apply to this application")]
    CriteriaMismatch,
    #[error("criteria {title} is inactive")]
    InactiveCriteria { title: String },
    #[error("criteria {title} requires a submitted file")]
    MissingSubmissionFile { title: String },
    #[error("status {status} is recorded automatically")]
    SystemManagedStatus { status: &'static str },
    #[error("application is already {status}")]
    ApplicationClosed { status: &'static str },
    #[error("section has no grade book")]
    MissingGradeBook,
    #[error("enrollment {enrollment} is not on the section roster")]
    NotOnRoster { enrollment: u64 },
    #[error("cannot move document request from {from} to {to}")]
    InvalidDocumentTransition { from: &'static str, to: &'static str },
    #[error("enrollment cannot move from {from} to {to}")]
    InvalidEnrollmentTransition { from: &'static str, to: &'static str },
}

impl RuleViolation {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Error raised by every domain service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Rule(#[from] RuleViolation),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Dependencies handed to each service.
pub struct ServiceContext<S> {
    pub(crate) store: Arc<S>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) notifier: Arc<dyn NotificationPublisher>,
    pub(crate) policy: PolicyConfig,
}

impl<S> ServiceContext<S> {
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationPublisher>,
        policy: PolicyConfig,
    ) -> Self {
        Self {
            store,
            clock,
            notifier,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn policy(&self) -> PolicyConfig {
        self.policy
    }
}

impl<S> Clone for ServiceContext<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            notifier: Arc::clone(&self.notifier),
            policy: self.policy,
        }
    }
}

impl<S: Store> ServiceContext<S> {
    pub(crate) fn read<T>(&self, f: impl FnOnce(&Database) -> ServiceResult<T>) -> ServiceResult<T> {
        self.store.read(f)
    }

    pub(crate) fn write<T>(
        &self,
        f: impl FnOnce(&mut Database) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        self.store.write(f)
    }
}

impl<S> ServiceContext<S> {
    /// Publishes a draft after its write committed.
    pub(crate) fn notify(&self, draft: NotificationDraft) -> ServiceResult<()> {
        debug!(user = %draft.user_id, kind = draft.kind, "publishing notification");
        self.notifier.publish(draft)?;
        Ok(())
    }
}

pub(crate) fn ensure_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), RuleViolation> {
    if end < start {
        Err(RuleViolation::InvalidDateRange { start, end })
    } else {
        Ok(())
    }
}

pub(crate) fn ensure_named(field: &'static str, value: &str) -> Result<(), RuleViolation> {
    if value.trim().is_empty() {
        Err(RuleViolation::invalid(field, "must not be blank"))
    } else {
        Ok(())
    }
}
