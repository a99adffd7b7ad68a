//! Relational tables kept in memory behind a transactional [`Store`].
//!
//! Every resource lives in a [`Table`] keyed by a typed id. Writes run against a working
//! copy of the [`Database`] and only replace the committed state when the closure returns
//! `Ok`, so hooks that fail (duplicate log rows, overlapping school years, ...) roll back
//! the write that fired them.

mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::academics::{
    AcademicProgram, AcademicTerm, Building, CalendarEntry, Campus, College, Course,
    CourseRequisite, Curriculum, CurriculumDetail, CurriculumTagging, ProgramRequirement,
    ProgramType, Requirement, Room, ScheduleAssignment, SchoolYear, Section, SectionTeacher,
    TestingCenter,
};
use crate::admissions::{
    AdmissionApplication, AdmissionLog, AdmissionSchedule, AdmissionScore, CriteriaSubmission,
    ProgramCriteria, UniversityAdmission, UniversityApplication, UniversityCriteria,
    UniversityLog, UniversitySchedule,
};
use crate::designations::{Designation, FamilyMember, User};
use crate::documents::{DocumentLog, DocumentRequest, DocumentType};
use crate::enrollment::{Enrollment, EnrollmentLog};
use crate::gradebook::{
    FinalGrade, GradeBook, GradeBookItem, GradeBookItemDetail, GradeBookScore, GradingPeriod,
    PeriodGrade,
};
use crate::notifications::Notification;

pub use memory::InMemoryStore;

/// Declares a `u64` newtype id that serializes as a bare number.
macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Implements [`Record`] for a struct carrying an `id` field.
macro_rules! record {
    ($ty:ty, $id:ty, $entity:literal) => {
        impl $crate::store::Record for $ty {
            type Id = $id;
            const ENTITY: &'static str = $entity;

            fn id(&self) -> Self::Id {
                self.id
            }
        }
    };
}

pub(crate) use record;
pub(crate) use record_id;

pub trait Record: Clone {
    type Id: Copy + Ord + fmt::Display + From<u64>;
    const ENTITY: &'static str;

    fn id(&self) -> Self::Id;
}

/// Rows ordered by id. Ids are never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table<R> {
    next_id: u64,
    rows: Vec<R>,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: Vec::new(),
        }
    }
}

impl<R: Record> Table<R> {
    fn position(&self, id: R::Id) -> Option<usize> {
        self.rows.binary_search_by_key(&id, |row| row.id()).ok()
    }

    pub fn get(&self, id: R::Id) -> Option<&R> {
        self.position(id).map(|index| &self.rows[index])
    }

    pub fn require(&self, id: R::Id) -> Result<&R, StoreError> {
        self.get(id).ok_or_else(|| StoreError::not_found::<R>(id))
    }

    pub fn require_mut(&mut self, id: R::Id) -> Result<&mut R, StoreError> {
        match self.position(id) {
            Some(index) => Ok(&mut self.rows[index]),
            None => Err(StoreError::not_found::<R>(id)),
        }
    }

    /// Allocates the next id and appends the row built from it.
    pub fn insert_with(&mut self, build: impl FnOnce(R::Id) -> R) -> R {
        let id = R::Id::from(self.next_id);
        self.next_id += 1;
        let row = build(id);
        self.rows.push(row.clone());
        row
    }

    pub fn remove(&mut self, id: R::Id) -> Result<R, StoreError> {
        match self.position(id) {
            Some(index) => Ok(self.rows.remove(index)),
            None => Err(StoreError::not_found::<R>(id)),
        }
    }

    /// Drops every row matching `predicate`, returning how many went away.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&R) -> bool) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| !predicate(row));
        before - self.rows.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.rows.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut R> {
        self.rows.iter_mut()
    }

    pub fn find(&self, mut predicate: impl FnMut(&R) -> bool) -> Option<&R> {
        self.rows.iter().find(|row| predicate(row))
    }

    pub fn find_mut(&mut self, mut predicate: impl FnMut(&R) -> bool) -> Option<&mut R> {
        self.rows.iter_mut().find(|row| predicate(row))
    }

    pub fn filter<'a, P>(&'a self, mut predicate: P) -> impl Iterator<Item = &'a R>
    where
        P: FnMut(&R) -> bool,
    {
        self.rows.iter().filter(move |row| predicate(row))
    }

    pub fn any(&self, predicate: impl FnMut(&R) -> bool) -> bool {
        self.rows.iter().any(predicate)
    }

    /// Fails with [`StoreError::Conflict`] when a row already matches `predicate`.
    pub fn ensure_unique(
        &self,
        constraint: &str,
        predicate: impl FnMut(&R) -> bool,
    ) -> Result<(), StoreError> {
        if self.any(predicate) {
            Err(StoreError::Conflict(constraint.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Every table the registrar persists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Database {
    pub campuses: Table<Campus>,
    pub buildings: Table<Building>,
    pub rooms: Table<Room>,
    pub colleges: Table<College>,
    pub program_types: Table<ProgramType>,
    pub programs: Table<AcademicProgram>,
    pub academic_terms: Table<AcademicTerm>,
    pub requirements: Table<Requirement>,
    pub program_requirements: Table<ProgramRequirement>,
    pub testing_centers: Table<TestingCenter>,
    pub school_years: Table<SchoolYear>,
    pub calendar: Table<CalendarEntry>,
    pub courses: Table<Course>,
    pub course_requisites: Table<CourseRequisite>,
    pub curriculums: Table<Curriculum>,
    pub curriculum_details: Table<CurriculumDetail>,
    pub curriculum_taggings: Table<CurriculumTagging>,
    pub sections: Table<Section>,
    pub schedule_assignments: Table<ScheduleAssignment>,
    pub section_teachers: Table<SectionTeacher>,
    pub admission_schedules: Table<AdmissionSchedule>,
    pub program_criteria: Table<ProgramCriteria>,
    pub admission_applications: Table<AdmissionApplication>,
    pub admission_logs: Table<AdmissionLog>,
    pub admission_scores: Table<AdmissionScore>,
    pub university_admissions: Table<UniversityAdmission>,
    pub university_criteria: Table<UniversityCriteria>,
    pub university_schedules: Table<UniversitySchedule>,
    pub university_applications: Table<UniversityApplication>,
    pub university_logs: Table<UniversityLog>,
    pub criteria_submissions: Table<CriteriaSubmission>,
    pub enrollments: Table<Enrollment>,
    pub enrollment_logs: Table<EnrollmentLog>,
    pub gradebooks: Table<GradeBook>,
    pub grading_periods: Table<GradingPeriod>,
    pub gradebook_items: Table<GradeBookItem>,
    pub item_details: Table<GradeBookItemDetail>,
    pub gradebook_scores: Table<GradeBookScore>,
    pub period_grades: Table<PeriodGrade>,
    pub final_grades: Table<FinalGrade>,
    pub document_types: Table<DocumentType>,
    pub document_requests: Table<DocumentRequest>,
    pub document_logs: Table<DocumentLog>,
    pub users: Table<User>,
    pub designations: Table<Designation>,
    pub family_members: Table<FamilyMember>,
    pub notifications: Table<Notification>,
}

/// Transactional access to the [`Database`].
pub trait Store: Send + Sync {
    fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Database) -> Result<T, E>,
        E: From<StoreError>;

    /// Runs `f` against a working copy; the copy is committed only on `Ok`.
    fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Database) -> Result<T, E>,
        E: From<StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found<R: Record>(id: R::Id) -> Self {
        Self::NotFound {
            entity: R::ENTITY,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    record_id!(WidgetId);

    #[derive(Debug, Clone, PartialEq)]
    struct Widget {
        id: WidgetId,
        label: String,
    }

    record!(Widget, WidgetId, "widget");

    fn widgets() -> Table<Widget> {
        let mut table = Table::default();
        for label in ["a", "b", "c"] {
            table.insert_with(|id| Widget {
                id,
                label: label.to_string(),
            });
        }
        table
    }

    #[test]
    fn ids_are_monotonic_and_not_reused() {
        let mut table = widgets();
        table.remove(WidgetId(3)).expect("row exists");
        let row = table.insert_with(|id| Widget {
            id,
            label: "d".to_string(),
        });
        assert_eq!(row.id, WidgetId(4));
        assert_eq!(table.len(), 3);
        assert!(table.get(WidgetId(3)).is_none());
    }

    #[test]
    fn require_reports_entity_and_id() {
        let table = widgets();
        let err = table.require(WidgetId(42)).expect_err("missing row");
        assert_eq!(
            err,
            StoreError::NotFound {
                entity: "widget",
                id: "42".to_string()
            }
        );
        assert_eq!(err.to_string(), "widget 42 not found");
    }

    #[test]
    fn ensure_unique_flags_duplicates() {
        let table = widgets();
        let err = table
            .ensure_unique("widget label", |row| row.label == "b")
            .expect_err("duplicate label");
        assert_eq!(err, StoreError::Conflict("widget label".to_string()));
        assert!(table.ensure_unique("widget label", |row| row.label == "z").is_ok());
    }

    #[test]
    fn remove_where_counts_removed_rows() {
        let mut table = widgets();
        let removed = table.remove_where(|row| row.label != "a");
        assert_eq!(removed, 2);
        assert_eq!(table.iter().map(|row| row.label.as_str()).collect::<Vec<_>>(), ["a"]);
    }
}
