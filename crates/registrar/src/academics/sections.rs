//! Sections, their weekly schedule, and assigned teachers.

use std::fmt;

use chrono::NaiveTime;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::curriculum::{CurriculumDetailId, CurriculumId};
use super::school_year::SchoolYearId;
use super::structure::RoomId;
use crate::designations::UserId;
use crate::service::RuleViolation;
use crate::store::{record, record_id, Database};

record_id!(SectionId);
record_id!(ScheduleAssignmentId);
record_id!(SectionTeacherId);

pub const DEFAULT_MIN_STUDENTS: u32 = 20;
pub const DEFAULT_MAX_STUDENTS: u32 = 40;
const CODE_LENGTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub curriculum_detail_id: CurriculumDetailId,
    pub school_year_id: Option<SchoolYearId>,
    pub section_ref: String,
    pub section_code: String,
    pub section_name: String,
    pub min_students: u32,
    pub max_students: u32,
    pub is_posted: bool,
}

record!(Section, SectionId, "section");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub const fn label(self) -> &'static str {
        match self {
            Weekday::Sunday => "Sunday",
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleAssignment {
    pub id: ScheduleAssignmentId,
    pub section_id: SectionId,
    pub room_id: RoomId,
    pub day_schedule: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

record!(ScheduleAssignment, ScheduleAssignmentId, "schedule assignment");

impl ScheduleAssignment {
    fn overlaps(&self, day: Weekday, start: NaiveTime, end: NaiveTime) -> bool {
        self.day_schedule == day && start < self.end_time && end > self.start_time
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTeacher {
    pub id: SectionTeacherId,
    pub section_id: SectionId,
    pub user_id: UserId,
}

record!(SectionTeacher, SectionTeacherId, "section teacher");

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateSectionsInput {
    pub curriculum_id: CurriculumId,
    pub year_order: u32,
    pub term_order: u32,
    #[serde(default)]
    pub auto_post: bool,
    pub number_of_section: u32,
    #[serde(default)]
    pub school_year_id: Option<SchoolYearId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleAssignmentInput {
    pub room_id: RoomId,
    pub day_schedule: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SectionTeacherInput {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    #[serde(flatten)]
    pub section: Section,
    pub course_code: String,
    pub course_title: String,
    pub available_slots: i64,
    pub has_grade_book: bool,
    pub schedules: Vec<ScheduleAssignment>,
    pub teachers: Vec<UserId>,
}

/// Letter and round of a generated section name: `A`, `B`, ..., `Z`, `A2`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct SectionSuffix {
    round: u32,
    letter: u8,
}

impl SectionSuffix {
    pub(crate) const FIRST: Self = Self {
        round: 1,
        letter: 0,
    };

    /// Reads the suffix out of `<code>_section_<year><LETTER><round?>`.
    pub(crate) fn parse(name: &str) -> Option<Self> {
        let (_, tail) = name.rsplit_once("_section_")?;
        let year_digits = tail.bytes().take_while(u8::is_ascii_digit).count();
        if year_digits == 0 {
            return None;
        }

        let rest = &tail[year_digits..];
        let mut chars = rest.chars();
        let letter = chars.next().filter(char::is_ascii_uppercase)?;
        let round_digits = chars.as_str();

        let round = if round_digits.is_empty() {
            1
        } else if round_digits.bytes().all(|byte| byte.is_ascii_digit()) {
            round_digits.parse().ok()?
        } else {
            return None;
        };

        Some(Self {
            round,
            letter: letter as u8 - b'A',
        })
    }

    pub(crate) fn next(self) -> Self {
        if self.letter >= 25 {
            Self {
                round: self.round + 1,
                letter: 0,
            }
        } else {
            Self {
                round: self.round,
                letter: self.letter + 1,
            }
        }
    }

    pub(crate) fn render(self, curriculum_code: &str, year_order: u32) -> String {
        let letter = char::from(b'A' + self.letter);
        if self.round > 1 {
            format!("{curriculum_code}_section_{year_order}{letter}{}", self.round)
        } else {
            format!("{curriculum_code}_section_{year_order}{letter}")
        }
    }
}

pub(crate) fn random_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_LENGTH)
        .map(char::from)
        .collect::<String>()
        .to_ascii_uppercase()
}

impl Database {
    /// Draws random codes until one is not used by any section.
    pub(crate) fn unique_section_code(&self, reserved: &[String]) -> String {
        loop {
            let code = random_code();
            if !reserved.contains(&code)
                && !self.sections.any(|section| section.section_code == code)
            {
                return code;
            }
        }
    }

    pub(crate) fn unique_section_ref(&self) -> String {
        loop {
            let reference = random_code();
            if !self.sections.any(|section| section.section_ref == reference) {
                return reference;
            }
        }
    }

    /// Highest suffix already used by sections of the curriculum's year and term.
    pub(crate) fn last_section_suffix(
        &self,
        curriculum: CurriculumId,
        year_order: u32,
        term_order: u32,
    ) -> Option<SectionSuffix> {
        self.sections
            .iter()
            .filter(|section| {
                self.curriculum_details
                    .get(section.curriculum_detail_id)
                    .is_some_and(|detail| {
                        detail.curriculum_id == curriculum
                            && detail.year_order == year_order
                            && detail.term_order == term_order
                    })
            })
            .filter_map(|section| SectionSuffix::parse(&section.section_name))
            .max()
    }

    pub(crate) fn ensure_room_free(
        &self,
        room: RoomId,
        day: Weekday,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<(), RuleViolation> {
        if end <= start {
            return Err(RuleViolation::InvalidTimeRange { start, end });
        }

        if self
            .schedule_assignments
            .any(|slot| slot.room_id == room && slot.overlaps(day, start, end))
        {
            return Err(RuleViolation::RoomDoubleBooked {
                day: day.to_string(),
            });
        }

        Ok(())
    }

    pub(crate) fn section_view(&self, section: &Section) -> SectionView {
        let course = self
            .curriculum_details
            .get(section.curriculum_detail_id)
            .and_then(|detail| self.courses.get(detail.course_id));

        SectionView {
            course_code: course
                .map(|course| course.course_code.clone())
                .unwrap_or_default(),
            course_title: course
                .map(|course| course.course_title.clone())
                .unwrap_or_default(),
            available_slots: self.available_slots(section),
            has_grade_book: self.gradebook_for_section(section.id).is_some(),
            schedules: self
                .schedule_assignments
                .filter(|slot| slot.section_id == section.id)
                .cloned()
                .collect(),
            teachers: self
                .section_teachers
                .filter(|teacher| teacher.section_id == section.id)
                .map(|teacher| teacher.user_id)
                .collect(),
            section: section.clone(),
        }
    }

    /// Capacity left after validated, non-dropped enrollments. Negative when overbooked.
    pub(crate) fn available_slots(&self, section: &Section) -> i64 {
        i64::from(section.max_students) - self.validated_enrollment_count(section.id) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generated_names() {
        assert_eq!(
            SectionSuffix::parse("BSIT-2024_section_1A"),
            Some(SectionSuffix::FIRST)
        );
        assert_eq!(
            SectionSuffix::parse("BSIT-2024_section_2C3"),
            Some(SectionSuffix {
                round: 3,
                letter: 2
            })
        );
        assert_eq!(SectionSuffix::parse("BSIT-2024_section_A"), None);
        assert_eq!(SectionSuffix::parse("custom name"), None);
        assert_eq!(SectionSuffix::parse("BSIT_section_1a"), None);
    }

    #[test]
    fn suffix_wraps_after_z() {
        let z = SectionSuffix::parse("CS_section_1Z").expect("parses");
        let next = z.next();
        assert_eq!(next.render("CS", 1), "CS_section_1A2");
        assert_eq!(next.next().render("CS", 1), "CS_section_1B2");
        assert_eq!(SectionSuffix::FIRST.render("CS", 4), "CS_section_4A");
    }

    #[test]
    fn later_rounds_sort_after_earlier_letters() {
        let z = SectionSuffix::parse("CS_section_1Z").expect("parses");
        let a2 = SectionSuffix::parse("CS_section_1A2").expect("parses");
        assert!(a2 > z);
    }

    #[test]
    fn random_codes_are_uppercase_alphanumeric() {
        let code = random_code();
        assert_eq!(code.len(), 8);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn room_conflicts_only_on_overlap() {
        let mut db = Database::default();
        let time = |h: u32| NaiveTime::from_hms_opt(h, 0, 0).expect("valid time");
        db.schedule_assignments.insert_with(|id| ScheduleAssignment {
            id,
            section_id: SectionId(1),
            room_id: RoomId(1),
            day_schedule: Weekday::Monday,
            start_time: time(8),
            end_time: time(10),
        });

        assert!(db
            .ensure_room_free(RoomId(1), Weekday::Monday, time(10), time(12))
            .is_ok());
        assert!(db
            .ensure_room_free(RoomId(1), Weekday::Tuesday, time(8), time(10))
            .is_ok());
        assert!(matches!(
            db.ensure_room_free(RoomId(1), Weekday::Monday, time(9), time(11)),
            Err(RuleViolation::RoomDoubleBooked { .. })
        ));
        assert!(matches!(
            db.ensure_room_free(RoomId(2), Weekday::Monday, time(11), time(9)),
            Err(RuleViolation::InvalidTimeRange { .. })
        ));
    }
}
