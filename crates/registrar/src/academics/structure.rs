//! Campuses, buildings, colleges, programs, and the other reference tables
//! the academic records hang off.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::school_year::SchoolYearId;
use crate::store::{record, record_id};

record_id!(CampusId);
record_id!(BuildingId);
record_id!(RoomId);
record_id!(CollegeId);
record_id!(ProgramTypeId);
record_id!(AcademicProgramId);
record_id!(AcademicTermId);
record_id!(RequirementId);
record_id!(ProgramRequirementId);
record_id!(TestingCenterId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campus {
    pub id: CampusId,
    pub name: String,
    pub short_name: String,
    pub address: Option<String>,
}

record!(Campus, CampusId, "campus");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub campus_id: CampusId,
    pub name: String,
    pub short_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

record!(Building, BuildingId, "building");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub building_id: BuildingId,
    pub name: String,
    pub short_name: String,
    pub floor: i32,
    pub room_code: String,
    pub is_lab: bool,
    pub room_capacity: u32,
}

record!(Room, RoomId, "room");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct College {
    pub id: CollegeId,
    pub campus_id: CampusId,
    pub college_name: String,
    pub college_shortname: String,
}

record!(College, CollegeId, "college");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramType {
    pub id: ProgramTypeId,
    pub name: String,
    pub description: Option<String>,
}

record!(ProgramType, ProgramTypeId, "program type");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicProgram {
    pub id: AcademicProgramId,
    pub college_id: CollegeId,
    pub program_type_id: ProgramTypeId,
    pub program_name: String,
    pub short_name: String,
    pub year_first_implemented: NaiveDate,
}

record!(AcademicProgram, AcademicProgramId, "academic program");

/// Term scheme of a curriculum, e.g. "Semester" with suffix "Semester" and two terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicTerm {
    pub id: AcademicTermId,
    pub name: String,
    pub suffix: String,
    pub description: Option<String>,
    pub number_of_terms: u8,
}

record!(AcademicTerm, AcademicTermId, "academic term");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
    Admission,
    Graduation,
    Enrollment,
    Scholarship,
    Transfer,
    General,
}

impl RequirementType {
    pub const fn label(self) -> &'static str {
        match self {
            RequirementType::Admission => "Admission",
            RequirementType::Graduation => "Graduation",
            RequirementType::Enrollment => "Enrollment",
            RequirementType::Scholarship => "Scholarship",
            RequirementType::Transfer => "Transfer",
            RequirementType::General => "General",
        }
    }
}

impl fmt::Display for RequirementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: RequirementId,
    pub requirement_name: String,
    pub description: Option<String>,
    pub requirement_type: RequirementType,
    pub is_mandatory: bool,
    pub is_active: bool,
}

record!(Requirement, RequirementId, "requirement");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRequirement {
    pub id: ProgramRequirementId,
    pub academic_program_id: AcademicProgramId,
    pub requirement_id: RequirementId,
    pub school_year_id: SchoolYearId,
    pub is_mandatory: bool,
    pub is_active: bool,
}

record!(ProgramRequirement, ProgramRequirementId, "program requirement");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestingCenter {
    pub id: TestingCenterId,
    pub room_id: RoomId,
    pub code: String,
}

record!(TestingCenter, TestingCenterId, "testing center");

#[derive(Debug, Clone, Deserialize)]
pub struct CampusInput {
    pub name: String,
    pub short_name: String,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildingInput {
    pub campus_id: CampusId,
    pub name: String,
    pub short_name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomInput {
    pub building_id: BuildingId,
    pub name: String,
    pub short_name: String,
    pub floor: i32,
    pub room_code: String,
    #[serde(default)]
    pub is_lab: bool,
    pub room_capacity: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollegeInput {
    pub campus_id: CampusId,
    pub college_name: String,
    pub college_shortname: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgramTypeInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcademicProgramInput {
    pub college_id: CollegeId,
    pub program_type_id: ProgramTypeId,
    pub program_name: String,
    pub short_name: String,
    pub year_first_implemented: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcademicTermInput {
    pub name: String,
    pub suffix: String,
    #[serde(default)]
    pub description: Option<String>,
    pub number_of_terms: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequirementInput {
    pub requirement_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub requirement_type: RequirementType,
    #[serde(default = "default_true")]
    pub is_mandatory: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgramRequirementInput {
    pub academic_program_id: AcademicProgramId,
    pub requirement_id: RequirementId,
    pub school_year_id: SchoolYearId,
    #[serde(default = "default_true")]
    pub is_mandatory: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestingCenterInput {
    pub room_id: RoomId,
    pub code: String,
}

pub(crate) fn default_true() -> bool {
    true
}
