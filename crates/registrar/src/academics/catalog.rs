//! Course catalog CSV import.
//!
//! Expected header:
//! `course_code,course_title,course_description,lecture_units,laboratory_units,credit_units,with_laboratory,is_specialize`.
//! Blank cells fall back to defaults; boolean columns accept `1/0`, `yes/no`, and `true/false`.

use serde::{Deserialize, Deserializer, Serialize};
use std::io::Read;
use std::path::Path;

use super::curriculum::CourseInput;

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row { line: u64, reason: String },
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read course catalog: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid course catalog CSV: {}", err),
            CatalogImportError::Row { line, reason } => {
                write!(f, "course catalog line {}: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
            CatalogImportError::Row { .. } => None,
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Outcome of loading a catalog into the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogImportSummary {
    pub created: Vec<String>,
    pub skipped: Vec<String>,
}

pub struct CourseCatalog;

impl CourseCatalog {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<CourseInput>, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<CourseInput>, CatalogImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut courses = Vec::new();

        for (index, record) in csv_reader.deserialize::<CatalogRow>().enumerate() {
            let row = record?;
            // header is line 1
            let line = index as u64 + 2;
            courses.push(row.into_input(line)?);
        }

        Ok(courses)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    course_code: String,
    course_title: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    course_description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    lecture_units: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    laboratory_units: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    credit_units: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    with_laboratory: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    is_specialize: Option<String>,
}

impl CatalogRow {
    fn into_input(self, line: u64) -> Result<CourseInput, CatalogImportError> {
        if self.course_code.is_empty() {
            return Err(CatalogImportError::Row {
                line,
                reason: "course_code is blank".to_string(),
            });
        }

        let lecture_units = parse_units(line, "lecture_units", self.lecture_units.as_deref())?;
        let laboratory_units =
            parse_units(line, "laboratory_units", self.laboratory_units.as_deref())?;
        let credit_units = match self.credit_units.as_deref() {
            Some(raw) => parse_units(line, "credit_units", Some(raw))?,
            None => lecture_units + laboratory_units,
        };
        let with_laboratory = match self.with_laboratory.as_deref() {
            Some(raw) => parse_flag(line, "with_laboratory", raw)?,
            None => laboratory_units > 0.0,
        };
        let is_specialize = match self.is_specialize.as_deref() {
            Some(raw) => parse_flag(line, "is_specialize", raw)?,
            None => false,
        };

        Ok(CourseInput {
            course_code: self.course_code,
            course_title: self.course_title,
            course_description: self.course_description.unwrap_or_default(),
            with_laboratory,
            is_specialize,
            lecture_units,
            laboratory_units,
            credit_units,
        })
    }
}

fn parse_units(line: u64, column: &str, raw: Option<&str>) -> Result<f64, CatalogImportError> {
    let Some(raw) = raw else {
        return Ok(0.0);
    };

    match raw.parse::<f64>() {
        Ok(value) if value >= 0.0 && value.is_finite() => Ok(value),
        _ => Err(CatalogImportError::Row {
            line,
            reason: format!("{column} must be a non-negative number (got '{raw}')"),
        }),
    }
}

fn parse_flag(line: u64, column: &str, raw: &str) -> Result<bool, CatalogImportError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" => Ok(false),
        _ => Err(CatalogImportError::Row {
            line,
            reason: format!("{column} must be a yes/no flag (got '{raw}')"),
        }),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
