//! Institutional structure, school years and their calendars, curricula, and sections.

mod calendar;
mod catalog;
mod curriculum;
mod router;
mod school_year;
mod section_service;
mod sections;
mod service;
mod structure;

pub use calendar::{
    AcademicCalendarBlueprint, CalendarEntry, CalendarEntryId, CalendarEntryInput, CalendarEvent,
    CalendarTemplate, PlannedEvent,
};
pub use catalog::{CatalogImportError, CatalogImportSummary, CourseCatalog};
pub use curriculum::{
    Course, CourseId, CourseInput, CourseRequisite, CourseRequisiteId, CourseRequisiteInput,
    CourseView, Curriculum, CurriculumDetail, CurriculumDetailId, CurriculumDetailInput,
    CurriculumDetailView, CurriculumId, CurriculumInput, CurriculumStatus, CurriculumTagging,
    CurriculumTaggingId, CurriculumTaggingView, Ordinal, RequisiteType, RequisiteView,
};
pub use router::{academic_router, section_router};
pub use school_year::{SchoolYear, SchoolYearId, SchoolYearInput, SchoolYearView};
pub use section_service::{SectionFilter, SectionService};
pub use sections::{
    GenerateSectionsInput, ScheduleAssignment, ScheduleAssignmentId, ScheduleAssignmentInput,
    Section, SectionId, SectionTeacher, SectionTeacherId, SectionTeacherInput, SectionView,
    Weekday, DEFAULT_MAX_STUDENTS, DEFAULT_MIN_STUDENTS,
};
pub use service::{AcademicService, CurriculumView};
pub use structure::*;
