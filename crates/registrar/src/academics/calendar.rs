//! Academic calendar events and the standard calendar generated for each new school year.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::school_year::{SchoolYear, SchoolYearId};
use crate::store::{record, record_id};

record_id!(CalendarEntryId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalendarEvent {
    Registration,
    Enrollment,
    Orientation,
    StartOfClasses,
    AcademicTransition,
    AddingDroppingOfSubjects,
    PeriodicExam,
    EndOfClasses,
    FacultyEvaluation,
    GradeSubmission,
    Deadline,
    Graduation,
    UniversityEvent,
    Holiday,
    Other,
}

impl CalendarEvent {
    pub const fn label(self) -> &'static str {
        match self {
            CalendarEvent::Registration => "Registration",
            CalendarEvent::Enrollment => "Enrollment",
            CalendarEvent::Orientation => "Orientation",
            CalendarEvent::StartOfClasses => "Start of Classes",
            CalendarEvent::AcademicTransition => "Academic Transition",
            CalendarEvent::AddingDroppingOfSubjects => "Adding / Dropping of Subjects",
            CalendarEvent::PeriodicExam => "Periodic Exam",
            CalendarEvent::EndOfClasses => "End of Classes",
            CalendarEvent::FacultyEvaluation => "Faculty Evaluation",
            CalendarEvent::GradeSubmission => "Grade Submission",
            CalendarEvent::Deadline => "Deadline",
            CalendarEvent::Graduation => "Graduation",
            CalendarEvent::UniversityEvent => "University Event",
            CalendarEvent::Holiday => "Holiday",
            CalendarEvent::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub id: CalendarEntryId,
    pub school_year_id: SchoolYearId,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub event: CalendarEvent,
    pub order: u32,
}

record!(CalendarEntry, CalendarEntryId, "academic calendar event");

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarEntryInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub event: CalendarEvent,
    #[serde(default)]
    pub order: Option<u32>,
}

/// Event offsets, in days, relative to the school year's start date.
#[derive(Debug, Clone, Copy)]
pub struct CalendarTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub event: CalendarEvent,
    pub start_offset: i64,
    pub end_offset: i64,
}

/// Event produced from a template for a concrete school year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedEvent {
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub event: CalendarEvent,
    pub order: u32,
}

#[derive(Debug)]
pub struct AcademicCalendarBlueprint {
    templates: Vec<CalendarTemplate>,
}

impl AcademicCalendarBlueprint {
    pub fn standard() -> Self {
        Self {
            templates: standard_templates(),
        }
    }

    pub fn templates(&self) -> &[CalendarTemplate] {
        &self.templates
    }

    /// Lays the templates over `[start, end]`.
    ///
    /// Both bounds of every event are clamped into the year; an event that would end
    /// before it starts collapses onto its start day.
    pub fn plan(&self, start: NaiveDate, end: NaiveDate) -> Vec<PlannedEvent> {
        let end = end.max(start);
        self.templates
            .iter()
            .zip(1u32..)
            .map(|(template, order)| {
                let event_start = offset(start, template.start_offset).clamp(start, end);
                let event_end = offset(start, template.end_offset).clamp(event_start, end);
                PlannedEvent {
                    name: template.name.to_string(),
                    description: template.description.to_string(),
                    start_date: event_start,
                    end_date: event_end,
                    event: template.event,
                    order,
                }
            })
            .collect()
    }

    pub fn plan_for(&self, year: &SchoolYear) -> Vec<PlannedEvent> {
        self.plan(year.start_date, year.end_date)
    }
}

/// `start` shifted by `days`, saturating at the calendar limits.
fn offset(start: NaiveDate, days: i64) -> NaiveDate {
    start
        .checked_add_signed(Duration::days(days))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

const fn template(
    name: &'static str,
    description: &'static str,
    event: CalendarEvent,
    start_offset: i64,
    end_offset: i64,
) -> CalendarTemplate {
    CalendarTemplate {
        name,
        description,
        event,
        start_offset,
        end_offset,
    }
}

fn standard_templates() -> Vec<CalendarTemplate> {
    use CalendarEvent::*;

    vec![
        // First semester
        template(
            "Enrollment Period - First Semester",
            "Regular and late enrollment for first semester",
            Enrollment,
            -14,
            -1,
        ),
        template(
            "Start of First Semester",
            "First Semester officially begins",
            AcademicTransition,
            0,
            0,
        ),
        template(
            "Start of Classes - First Semester",
            "Classes begin for first semester",
            StartOfClasses,
            0,
            0,
        ),
        template(
            "Adding / Dropping of Subjects - First Semester",
            "Adding/Dropping period - requires adviser approval",
            AddingDroppingOfSubjects,
            0,
            13,
        ),
        template(
            "Preliminary Examinations - First Semester",
            "Preliminary examinations for first semester",
            PeriodicExam,
            28,
            34,
        ),
        template(
            "Grade Submission Deadline - Preliminary (First Semester)",
            "Deadline for faculty to submit preliminary grades to registrar",
            GradeSubmission,
            35,
            35,
        ),
        template(
            "Midterm Examinations - First Semester",
            "Midterm examinations for first semester",
            PeriodicExam,
            56,
            62,
        ),
        template(
            "Grade Submission Deadline - Midterm (First Semester)",
            "Deadline for faculty to submit midterm grades to registrar",
            GradeSubmission,
            63,
            63,
        ),
        template(
            "Final Examinations - First Semester",
            "Final examinations for first semester",
            PeriodicExam,
            100,
            106,
        ),
        template(
            "Faculty Evaluation - First Semester",
            "Student evaluation of faculty for first semester",
            FacultyEvaluation,
            107,
            113,
        ),
        template(
            "End of Classes - First Semester",
            "Last day of classes for first semester",
            EndOfClasses,
            139,
            139,
        ),
        template(
            "Christmas Break",
            "Christmas and New Year holiday break",
            Holiday,
            140,
            154,
        ),
        template(
            "Grade Submission Deadline - First Semester",
            "Deadline for faculty to submit first semester grades to registrar",
            GradeSubmission,
            155,
            155,
        ),
        // Second semester
        template(
            "Enrollment Period - Second Semester",
            "Regular and late enrollment for second semester",
            Enrollment,
            156,
            168,
        ),
        template(
            "Start of Second Semester",
            "Second Semester officially begins",
            AcademicTransition,
            169,
            169,
        ),
        template(
            "Start of Classes - Second Semester",
            "Classes begin for second semester",
            StartOfClasses,
            169,
            169,
        ),
        template(
            "Adding / Dropping of Subjects - Second Semester",
            "Adding/Dropping period - requires adviser approval",
            AddingDroppingOfSubjects,
            169,
            182,
        ),
        template(
            "Preliminary Examinations - Second Semester",
            "Preliminary examinations for second semester",
            PeriodicExam,
            197,
            203,
        ),
        template(
            "Grade Submission Deadline - Preliminary (Second Semester)",
            "Deadline for faculty to submit preliminary grades to registrar",
            GradeSubmission,
            204,
            204,
        ),
        template(
            "Holy Week Break",
            "Holy Week holiday (no classes)",
            Holiday,
            225,
            231,
        ),
        template(
            "Midterm Examinations - Second Semester",
            "Midterm examinations for second semester",
            PeriodicExam,
            253,
            259,
        ),
        template(
            "Grade Submission Deadline - Midterm (Second Semester)",
            "Deadline for faculty to submit midterm grades to registrar",
            GradeSubmission,
            260,
            260,
        ),
        template(
            "Final Examinations - Second Semester",
            "Final examinations for second semester",
            PeriodicExam,
            281,
            287,
        ),
        template(
            "Faculty Evaluation - Second Semester",
            "Student evaluation of faculty for second semester",
            FacultyEvaluation,
            288,
            294,
        ),
        template(
            "End of Classes - Second Semester",
            "Last day of classes for second semester",
            EndOfClasses,
            295,
            295,
        ),
        template(
            "Grade Submission Deadline - Second Semester",
            "Deadline for faculty to submit second semester grades to registrar",
            GradeSubmission,
            296,
            296,
        ),
        template(
            "Graduation Ceremony",
            "Annual graduation ceremony - End of AY",
            Graduation,
            297,
            297,
        ),
        // Summer term
        template(
            "Enrollment - Summer Term",
            "Enrollment for optional summer term",
            Enrollment,
            298,
            310,
        ),
        template(
            "Start of Summer Term",
            "Summer Term officially begins",
            AcademicTransition,
            311,
            311,
        ),
        template(
            "Summer Classes",
            "Intensive summer courses",
            StartOfClasses,
            311,
            338,
        ),
        template(
            "Adding / Dropping of Subjects - Summer Term",
            "Adding/Dropping period for summer - requires adviser approval",
            AddingDroppingOfSubjects,
            311,
            317,
        ),
        template(
            "End of Classes - Summer Term",
            "Last day of classes for summer term",
            EndOfClasses,
            338,
            338,
        ),
        template(
            "Final Examinations - Summer Term",
            "Final examinations for summer term",
            PeriodicExam,
            339,
            345,
        ),
        template(
            "Faculty Evaluation - Summer Term",
            "Student evaluation of faculty for summer term",
            FacultyEvaluation,
            339,
            345,
        ),
        template(
            "Grade Submission Deadline - Summer Term",
            "Deadline for faculty to submit summer term grades to registrar",
            GradeSubmission,
            346,
            346,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn standard_blueprint_has_ordered_events() {
        let events = AcademicCalendarBlueprint::standard().plan(date(2025, 8, 4), date(2026, 7, 31));
        assert_eq!(events.len(), 35);
        assert!(events
            .iter()
            .zip(1u32..)
            .all(|(event, order)| event.order == order));
        assert_eq!(events[11].name, "Christmas Break");
        assert_eq!(events[11].start_date, date(2025, 12, 22));
        assert_eq!(events[11].end_date, date(2026, 1, 5));
    }

    #[test]
    fn events_stay_inside_the_year() {
        let start = date(2025, 8, 4);
        let end = date(2026, 5, 31);
        let events = AcademicCalendarBlueprint::standard().plan(start, end);

        for event in &events {
            assert!(event.start_date >= start, "{} starts early", event.name);
            assert!(event.end_date <= end, "{} ends late", event.name);
            assert!(event.start_date <= event.end_date, "{} inverted", event.name);
        }

        // the pre-term enrollment window collapses onto the first day
        assert_eq!(events[0].start_date, start);
        assert_eq!(events[0].end_date, start);

        let summer_grades = events.last().expect("last event");
        assert_eq!(summer_grades.start_date, end);
        assert_eq!(summer_grades.end_date, end);
    }

    #[test]
    fn offsets_saturate_at_the_last_representable_day() {
        let start = NaiveDate::MAX - Duration::days(10);
        let events = AcademicCalendarBlueprint::standard().plan(start, NaiveDate::MAX);

        assert_eq!(events.len(), 35);
        assert_eq!(events[0].start_date, start);
        assert!(events.iter().all(|event| event.end_date <= NaiveDate::MAX));
        assert_eq!(events.last().map(|event| event.end_date), Some(NaiveDate::MAX));
    }
}
