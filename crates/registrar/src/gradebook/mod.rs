//! Grade books: weighted grading periods, items, and score details per section, plus the
//! score, period-grade, and final-grade sheets computed from them.

mod router;
mod service;
mod sheets;

use serde::{Deserialize, Serialize};

use crate::academics::{AcademicProgramId, SectionId};
use crate::enrollment::EnrollmentId;
use crate::store::{record, record_id, Database};

pub use router::router;
pub use service::{GradeBookFilter, GradeBookService, InstantiateInput};
pub use sheets::{
    FinalGradeEntry, FinalGradeRow, FinalGradeSheet, PeriodGradeCell, PeriodGradeEntry,
    PeriodGradeRow, PeriodGradeSheet, ScoreCell, ScoreEntry, ScoreRow, ScoreSheet,
};

record_id!(GradeBookId);
record_id!(GradingPeriodId);
record_id!(GradeBookItemId);
record_id!(GradeBookItemDetailId);
record_id!(GradeBookScoreId);
record_id!(PeriodGradeId);
record_id!(FinalGradeId);

/// Weights inside one level must add up to this.
pub const FULL_WEIGHT: f64 = 100.0;
const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeBook {
    pub id: GradeBookId,
    pub section_id: Option<SectionId>,
    pub academic_program_id: AcademicProgramId,
    pub is_template: bool,
    pub title: String,
}

record!(GradeBook, GradeBookId, "grade book");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingPeriod {
    pub id: GradingPeriodId,
    pub gradebook_id: GradeBookId,
    pub title: String,
    pub weight: f64,
}

record!(GradingPeriod, GradingPeriodId, "grading period");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeBookItem {
    pub id: GradeBookItemId,
    pub grading_period_id: GradingPeriodId,
    pub title: String,
    pub weight: f64,
}

record!(GradeBookItem, GradeBookItemId, "grade book item");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeBookItemDetail {
    pub id: GradeBookItemDetailId,
    pub item_id: GradeBookItemId,
    pub title: String,
    pub min_score: f64,
    pub max_score: f64,
    pub weight: f64,
}

record!(GradeBookItemDetail, GradeBookItemDetailId, "grade book item detail");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeBookScore {
    pub id: GradeBookScoreId,
    pub detail_id: GradeBookItemDetailId,
    pub enrollment_id: EnrollmentId,
    pub score: f64,
}

record!(GradeBookScore, GradeBookScoreId, "grade book score");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodGrade {
    pub id: PeriodGradeId,
    pub grading_period_id: GradingPeriodId,
    pub enrollment_id: EnrollmentId,
    pub grade: f64,
    pub is_posted: bool,
}

record!(PeriodGrade, PeriodGradeId, "grading period grade");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalGrade {
    pub id: FinalGradeId,
    pub enrollment_id: EnrollmentId,
    pub grade: f64,
    pub credited_units: f64,
    pub is_posted: bool,
}

record!(FinalGrade, FinalGradeId, "final grade");

#[derive(Debug, Clone, Deserialize)]
pub struct DetailInput {
    pub title: String,
    #[serde(default)]
    pub min_score: f64,
    pub max_score: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemInput {
    pub title: String,
    pub weight: f64,
    #[serde(default)]
    pub details: Vec<DetailInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeriodInput {
    pub title: String,
    pub weight: f64,
    #[serde(default)]
    pub items: Vec<ItemInput>,
}

/// A whole grade book tree written in one go.
#[derive(Debug, Clone, Deserialize)]
pub struct GradeBookInput {
    #[serde(default)]
    pub section_id: Option<SectionId>,
    pub academic_program_id: AcademicProgramId,
    #[serde(default)]
    pub is_template: bool,
    pub title: String,
    #[serde(default)]
    pub periods: Vec<PeriodInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: GradeBookItem,
    pub details: Vec<GradeBookItemDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodView {
    #[serde(flatten)]
    pub period: GradingPeriod,
    pub items: Vec<ItemView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradeBookView {
    #[serde(flatten)]
    pub gradebook: GradeBook,
    pub fully_setup: bool,
    pub periods: Vec<PeriodView>,
}

pub(crate) fn weights_complete(weights: impl Iterator<Item = f64>) -> bool {
    let mut count = 0;
    let mut total = 0.0;
    for weight in weights {
        count += 1;
        total += weight;
    }
    count > 0 && (total - FULL_WEIGHT).abs() < WEIGHT_TOLERANCE
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Database {
    /// The working (non-template) grade book attached to `section`.
    pub(crate) fn gradebook_for_section(&self, section: SectionId) -> Option<&GradeBook> {
        self.gradebooks
            .find(|book| !book.is_template && book.section_id == Some(section))
    }

    pub(crate) fn periods_of(&self, gradebook: GradeBookId) -> impl Iterator<Item = &GradingPeriod> {
        self.grading_periods
            .filter(move |period| period.gradebook_id == gradebook)
    }

    pub(crate) fn items_of(&self, period: GradingPeriodId) -> impl Iterator<Item = &GradeBookItem> {
        self.gradebook_items
            .filter(move |item| item.grading_period_id == period)
    }

    pub(crate) fn details_of(
        &self,
        item: GradeBookItemId,
    ) -> impl Iterator<Item = &GradeBookItemDetail> {
        self.item_details.filter(move |detail| detail.item_id == item)
    }

    /// Every level is non-empty and its weights add up to 100.
    pub(crate) fn is_fully_setup(&self, gradebook: GradeBookId) -> bool {
        weights_complete(self.periods_of(gradebook).map(|period| period.weight))
            && self.periods_of(gradebook).all(|period| {
                weights_complete(self.items_of(period.id).map(|item| item.weight))
                    && self.items_of(period.id).all(|item| {
                        weights_complete(self.details_of(item.id).map(|detail| detail.weight))
                    })
            })
    }

    pub(crate) fn gradebook_view(&self, gradebook: &GradeBook) -> GradeBookView {
        let periods = self
            .periods_of(gradebook.id)
            .map(|period| PeriodView {
                items: self
                    .items_of(period.id)
                    .map(|item| ItemView {
                        details: self.details_of(item.id).cloned().collect(),
                        item: item.clone(),
                    })
                    .collect(),
                period: period.clone(),
            })
            .collect();

        GradeBookView {
            fully_setup: self.is_fully_setup(gradebook.id),
            periods,
            gradebook: gradebook.clone(),
        }
    }

    /// Removes the grade book with its tree and recorded scores. Returns the number of scores dropped.
    pub(crate) fn remove_gradebook(&mut self, gradebook: GradeBookId) -> usize {
        let periods: Vec<_> = self.periods_of(gradebook).map(|period| period.id).collect();
        let items: Vec<_> = self
            .gradebook_items
            .filter(|item| periods.contains(&item.grading_period_id))
            .map(|item| item.id)
            .collect();
        let details: Vec<_> = self
            .item_details
            .filter(|detail| items.contains(&detail.item_id))
            .map(|detail| detail.id)
            .collect();

        let scores = self
            .gradebook_scores
            .remove_where(|row| details.contains(&row.detail_id));
        self.period_grades
            .remove_where(|row| periods.contains(&row.grading_period_id));
        self.item_details.remove_where(|row| details.contains(&row.id));
        self.gradebook_items.remove_where(|row| items.contains(&row.id));
        self.grading_periods.remove_where(|row| periods.contains(&row.id));
        self.gradebooks.remove_where(|book| book.id == gradebook);
        scores
    }

    /// Writes a period/item/detail tree under `gradebook`.
    pub(crate) fn insert_gradebook_tree(&mut self, gradebook: GradeBookId, periods: Vec<PeriodInput>) {
        for period in periods {
            let period_id = self
                .grading_periods
                .insert_with(|id| GradingPeriod {
                    id,
                    gradebook_id: gradebook,
                    title: period.title,
                    weight: period.weight,
                })
                .id;
            for item in period.items {
                let item_id = self
                    .gradebook_items
                    .insert_with(|id| GradeBookItem {
                        id,
                        grading_period_id: period_id,
                        title: item.title,
                        weight: item.weight,
                    })
                    .id;
                for detail in item.details {
                    self.item_details.insert_with(|id| GradeBookItemDetail {
                        id,
                        item_id,
                        title: detail.title,
                        min_score: detail.min_score,
                        max_score: detail.max_score,
                        weight: detail.weight,
                    });
                }
            }
        }
    }

    /// The tree of `gradebook` as inputs, ready to be copied elsewhere.
    pub(crate) fn gradebook_tree(&self, gradebook: GradeBookId) -> Vec<PeriodInput> {
        self.periods_of(gradebook)
            .map(|period| PeriodInput {
                title: period.title.clone(),
                weight: period.weight,
                items: self
                    .items_of(period.id)
                    .map(|item| ItemInput {
                        title: item.title.clone(),
                        weight: item.weight,
                        details: self
                            .details_of(item.id)
                            .map(|detail| DetailInput {
                                title: detail.title.clone(),
                                min_score: detail.min_score,
                                max_score: detail.max_score,
                                weight: detail.weight,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(title: &str, weight: f64) -> DetailInput {
        DetailInput {
            title: title.to_string(),
            min_score: 0.0,
            max_score: 50.0,
            weight,
        }
    }

    fn book(db: &mut Database, periods: Vec<PeriodInput>) -> GradeBookId {
        let book = db.gradebooks.insert_with(|id| GradeBook {
            id,
            section_id: Some(SectionId(1)),
            academic_program_id: AcademicProgramId(1),
            is_template: false,
            title: "Programming 1".to_string(),
        });
        db.insert_gradebook_tree(book.id, periods);
        book.id
    }

    fn period(title: &str, weight: f64, items: Vec<ItemInput>) -> PeriodInput {
        PeriodInput {
            title: title.to_string(),
            weight,
            items,
        }
    }

    fn item(title: &str, weight: f64, details: Vec<DetailInput>) -> ItemInput {
        ItemInput {
            title: title.to_string(),
            weight,
            details,
        }
    }

    #[test]
    fn complete_weights_at_every_level_are_fully_setup() {
        let mut db = Database::default();
        let complete = book(
            &mut db,
            vec![
                period(
                    "Midterm",
                    40.0,
                    vec![
                        item("Quizzes", 30.0, vec![detail("Quiz 1", 50.0), detail("Quiz 2", 50.0)]),
                        item("Exam", 70.0, vec![detail("Midterm Exam", 100.0)]),
                    ],
                ),
                period(
                    "Finals",
                    60.0,
                    vec![item("Exam", 100.0, vec![detail("Final Exam", 100.0)])],
                ),
            ],
        );

        assert!(db.is_fully_setup(complete));
        let view = db.gradebook_view(db.gradebook_for_section(SectionId(1)).unwrap());
        assert_eq!(view.periods.len(), 2);
        assert_eq!(view.periods[0].items[0].details.len(), 2);
    }

    #[test]
    fn missing_or_short_levels_are_not_fully_setup() {
        let mut db = Database::default();
        let empty = book(&mut db, Vec::new());
        let short_details = book(
            &mut db,
            vec![period(
                "Finals",
                100.0,
                vec![item("Exam", 100.0, vec![detail("Final Exam", 90.0)])],
            )],
        );
        let empty_item = book(
            &mut db,
            vec![period("Finals", 100.0, vec![item("Exam", 100.0, Vec::new())])],
        );

        assert!(!db.is_fully_setup(empty));
        assert!(!db.is_fully_setup(short_details));
        assert!(!db.is_fully_setup(empty_item));
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(84.456), 84.46);
        assert_eq!(round2(74.994), 74.99);
    }
}
