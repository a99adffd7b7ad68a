//! Courses, requisites, curricula, and curriculum tagging of students.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::structure::{AcademicProgramId, AcademicTermId};
use crate::designations::UserId;
use crate::store::{record, record_id, Database};

record_id!(CourseId);
record_id!(CourseRequisiteId);
record_id!(CurriculumId);
record_id!(CurriculumDetailId);
record_id!(CurriculumTaggingId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub course_code: String,
    pub course_title: String,
    pub course_description: String,
    pub with_laboratory: bool,
    pub is_specialize: bool,
    pub lecture_units: f64,
    pub laboratory_units: f64,
    pub credit_units: f64,
}

record!(Course, CourseId, "course");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequisiteType {
    #[serde(rename = "pre")]
    PreRequisite,
    #[serde(rename = "co")]
    CoRequisite,
}

impl RequisiteType {
    pub const fn label(self) -> &'static str {
        match self {
            RequisiteType::PreRequisite => "Pre-requisite",
            RequisiteType::CoRequisite => "Co-requisite",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRequisite {
    pub id: CourseRequisiteId,
    pub course_id: CourseId,
    pub requisite_course_id: CourseId,
    pub requisite_type: RequisiteType,
}

record!(CourseRequisite, CourseRequisiteId, "course requisite");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurriculumStatus {
    Active,
    Pending,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curriculum {
    pub id: CurriculumId,
    pub academic_program_id: AcademicProgramId,
    pub academic_term_id: AcademicTermId,
    pub curriculum_code: String,
    pub curriculum_name: String,
    pub description: Option<String>,
    pub effective_year: i32,
    pub total_units: u32,
    pub total_hours: u32,
    pub status: CurriculumStatus,
    pub approved_date: Option<NaiveDate>,
    pub approved_by: Option<String>,
}

record!(Curriculum, CurriculumId, "curriculum");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumDetail {
    pub id: CurriculumDetailId,
    pub curriculum_id: CurriculumId,
    pub course_id: CourseId,
    pub year_order: u32,
    pub term_order: u32,
    pub term_alias: String,
    pub is_include_gwa: bool,
}

record!(CurriculumDetail, CurriculumDetailId, "curriculum detail");

impl CurriculumDetail {
    /// "1st Year", "2nd Year", ...
    pub fn year_label(&self) -> String {
        format!("{} Year", Ordinal(self.year_order))
    }

    /// Term ordinal followed by the alias, falling back to the term scheme's suffix.
    pub fn term_label(&self, fallback_suffix: &str) -> String {
        let alias = if self.term_alias.trim().is_empty() {
            fallback_suffix
        } else {
            self.term_alias.as_str()
        };
        format!("{} {}", Ordinal(self.term_order), alias)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumTagging {
    pub id: CurriculumTaggingId,
    pub curriculum_id: CurriculumId,
    pub user_id: UserId,
    pub is_active: bool,
}

record!(CurriculumTagging, CurriculumTaggingId, "curriculum tagging");

/// English ordinal, e.g. `1st`, `12th`, `23rd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordinal(pub u32);

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.0;
        let suffix = match (n % 10, n % 100) {
            (_, 11..=13) => "th",
            (1, _) => "st",
            (2, _) => "nd",
            (3, _) => "rd",
            _ => "th",
        };
        write!(f, "{n}{suffix}")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseInput {
    pub course_code: String,
    pub course_title: String,
    #[serde(default)]
    pub course_description: String,
    #[serde(default)]
    pub with_laboratory: bool,
    #[serde(default)]
    pub is_specialize: bool,
    pub lecture_units: f64,
    #[serde(default)]
    pub laboratory_units: f64,
    pub credit_units: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseRequisiteInput {
    pub requisite_course_id: CourseId,
    #[serde(default = "default_requisite")]
    pub requisite_type: RequisiteType,
}

fn default_requisite() -> RequisiteType {
    RequisiteType::PreRequisite
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurriculumInput {
    pub academic_program_id: AcademicProgramId,
    pub academic_term_id: AcademicTermId,
    pub curriculum_code: String,
    pub curriculum_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub effective_year: i32,
    #[serde(default)]
    pub total_units: u32,
    #[serde(default)]
    pub total_hours: u32,
    #[serde(default = "default_status")]
    pub status: CurriculumStatus,
    #[serde(default)]
    pub approved_date: Option<NaiveDate>,
    #[serde(default)]
    pub approved_by: Option<String>,
}

fn default_status() -> CurriculumStatus {
    CurriculumStatus::Active
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurriculumDetailInput {
    pub course_id: CourseId,
    pub year_order: u32,
    pub term_order: u32,
    #[serde(default)]
    pub term_alias: String,
    #[serde(default)]
    pub is_include_gwa: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurriculumDetailView {
    #[serde(flatten)]
    pub detail: CurriculumDetail,
    pub course_code: String,
    pub course_title: String,
    pub year_label: String,
    pub term_label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseView {
    #[serde(flatten)]
    pub course: Course,
    pub requisites: Vec<RequisiteView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequisiteView {
    pub id: CourseRequisiteId,
    pub requisite_course_id: CourseId,
    pub course_code: String,
    pub requisite_type: RequisiteType,
    pub requisite_type_label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurriculumTaggingView {
    #[serde(flatten)]
    pub tagging: CurriculumTagging,
    pub curriculum_code: String,
    pub is_internal_student: bool,
}

impl Database {
    pub(crate) fn curriculum_detail_view(&self, detail: &CurriculumDetail) -> CurriculumDetailView {
        let course = self.courses.get(detail.course_id);
        let suffix = self
            .curriculums
            .get(detail.curriculum_id)
            .and_then(|curriculum| self.academic_terms.get(curriculum.academic_term_id))
            .map(|term| term.suffix.as_str())
            .unwrap_or("Term");

        CurriculumDetailView {
            course_code: course
                .map(|course| course.course_code.clone())
                .unwrap_or_default(),
            course_title: course
                .map(|course| course.course_title.clone())
                .unwrap_or_default(),
            year_label: detail.year_label(),
            term_label: detail.term_label(suffix),
            detail: detail.clone(),
        }
    }

    pub(crate) fn course_view(&self, course: &Course) -> CourseView {
        let requisites = self
            .course_requisites
            .filter(|requisite| requisite.course_id == course.id)
            .map(|requisite| RequisiteView {
                id: requisite.id,
                requisite_course_id: requisite.requisite_course_id,
                course_code: self
                    .courses
                    .get(requisite.requisite_course_id)
                    .map(|course| course.course_code.clone())
                    .unwrap_or_default(),
                requisite_type: requisite.requisite_type,
                requisite_type_label: requisite.requisite_type.label(),
            })
            .collect();

        CourseView {
            course: course.clone(),
            requisites,
        }
    }

    /// Internal students are those whose tagging came from an officially approved enrollment.
    pub(crate) fn curriculum_tagging_view(&self, tagging: &CurriculumTagging) -> CurriculumTaggingView {
        CurriculumTaggingView {
            curriculum_code: self
                .curriculums
                .get(tagging.curriculum_id)
                .map(|curriculum| curriculum.curriculum_code.clone())
                .unwrap_or_default(),
            is_internal_student: self.is_student(tagging.user_id),
            tagging: tagging.clone(),
        }
    }

    /// Deactivates every other tagging of `user` and marks `curriculum` as the active one.
    pub(crate) fn activate_curriculum_tagging(
        &mut self,
        user: UserId,
        curriculum: CurriculumId,
    ) -> CurriculumTagging {
        for tagging in self
            .curriculum_taggings
            .iter_mut()
            .filter(|tagging| tagging.user_id == user && tagging.is_active)
        {
            tagging.is_active = false;
        }

        if let Some(existing) = self
            .curriculum_taggings
            .find_mut(|tagging| tagging.user_id == user && tagging.curriculum_id == curriculum)
        {
            existing.is_active = true;
            return existing.clone();
        }

        self.curriculum_taggings.insert_with(|id| CurriculumTagging {
            id,
            curriculum_id: curriculum,
            user_id: user,
            is_active: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_handle_teens() {
        let rendered: Vec<String> = [1, 2, 3, 4, 11, 12, 13, 21, 22, 23, 101, 111]
            .into_iter()
            .map(|n| Ordinal(n).to_string())
            .collect();
        assert_eq!(
            rendered,
            [
                "1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "22nd", "23rd",
                "101st", "111th"
            ]
        );
    }

    #[test]
    fn detail_labels_fall_back_to_term_suffix() {
        let mut detail = CurriculumDetail {
            id: CurriculumDetailId(1),
            curriculum_id: CurriculumId(1),
            course_id: CourseId(1),
            year_order: 2,
            term_order: 1,
            term_alias: String::new(),
            is_include_gwa: true,
        };
        assert_eq!(detail.year_label(), "2nd Year");
        assert_eq!(detail.term_label("Semester"), "1st Semester");

        detail.term_alias = "Trimester".to_string();
        assert_eq!(detail.term_label("Semester"), "1st Trimester");
    }

    #[test]
    fn activating_a_tagging_keeps_one_active() {
        let mut db = Database::default();
        let user = UserId(7);
        db.activate_curriculum_tagging(user, CurriculumId(1));
        db.activate_curriculum_tagging(user, CurriculumId(2));
        let reactivated = db.activate_curriculum_tagging(user, CurriculumId(1));

        assert!(reactivated.is_active);
        assert_eq!(db.curriculum_taggings.len(), 2);
        let active: Vec<_> = db
            .curriculum_taggings
            .filter(|tagging| tagging.is_active)
            .map(|tagging| tagging.curriculum_id)
            .collect();
        assert_eq!(active, vec![CurriculumId(1)]);
    }
}
