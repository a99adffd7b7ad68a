use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::service::{ensure_date_range, ensure_named, RuleViolation, ServiceError};
use crate::store::{record, record_id, Database, StoreError};

record_id!(SchoolYearId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolYear {
    pub id: SchoolYearId,
    pub school_year_code: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
}

record!(SchoolYear, SchoolYearId, "school year");

impl SchoolYear {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.end_date && end >= self.start_date
    }

    /// Inactive years and days outside the year are read-only.
    pub fn is_locked(&self, today: NaiveDate) -> bool {
        !self.is_active || !self.contains(today)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchoolYearInput {
    pub school_year_code: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_active: bool,
}

impl SchoolYearInput {
    pub(crate) fn normalized(self) -> Self {
        Self {
            school_year_code: self.school_year_code.trim().to_string(),
            ..self
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SchoolYearView {
    #[serde(flatten)]
    pub school_year: SchoolYear,
    pub is_locked: bool,
    pub is_current: bool,
}

impl Database {
    /// Checks date order, overlap, the single-active rule, and code uniqueness.
    pub(crate) fn validate_school_year(
        &self,
        input: &SchoolYearInput,
        exclude: Option<SchoolYearId>,
    ) -> Result<(), ServiceError> {
        let code = input.school_year_code.trim();
        ensure_named("school_year_code", code)?;
        ensure_date_range(input.start_date, input.end_date)?;

        if let Some(existing) = self
            .other_school_years(exclude)
            .find(|year| year.overlaps(input.start_date, input.end_date))
        {
            return Err(RuleViolation::SchoolYearOverlap {
                code: existing.school_year_code.clone(),
            }
            .into());
        }

        if input.is_active && self.other_school_years(exclude).any(|year| year.is_active) {
            return Err(RuleViolation::MultipleActiveSchoolYears.into());
        }

        if self
            .other_school_years(exclude)
            .any(|year| year.school_year_code == code)
        {
            return Err(
                StoreError::Conflict(format!("school year code {code} already exists")).into(),
            );
        }

        Ok(())
    }

    fn other_school_years(
        &self,
        exclude: Option<SchoolYearId>,
    ) -> impl Iterator<Item = &SchoolYear> + '_ {
        self.school_years
            .iter()
            .filter(move |year| Some(year.id) != exclude)
    }

    /// Current means today falls in the year and no later year has been scheduled.
    pub(crate) fn school_year_is_current(&self, year: &SchoolYear, today: NaiveDate) -> bool {
        year.contains(today)
            && !self
                .school_years
                .any(|other| other.start_date > year.end_date)
    }

    pub(crate) fn school_year_view(&self, year: &SchoolYear, today: NaiveDate) -> SchoolYearView {
        SchoolYearView {
            is_locked: year.is_locked(today),
            is_current: self.school_year_is_current(year, today),
            school_year: year.clone(),
        }
    }

    pub(crate) fn active_school_year(&self) -> Option<&SchoolYear> {
        self.school_years.find(|year| year.is_active)
    }
}
